use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::billing::{CreateSubscriptionEventInput, SubscriptionEventRepo},
};

#[async_trait]
impl SubscriptionEventRepo for PostgresPersistence {
    async fn create(&self, input: &CreateSubscriptionEventInput) -> AppResult<()> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO subscription_events
                (id, user_id, event_type, status, plan, amount_cents, stripe_event_id, payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(input.user_id)
        .bind(&input.event_type)
        .bind(input.status)
        .bind(input.plan)
        .bind(input.amount_cents)
        .bind(&input.stripe_event_id)
        .bind(&input.payload)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn exists_by_stripe_event_id(&self, stripe_event_id: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM subscription_events WHERE stripe_event_id = $1)",
        )
        .bind(stripe_event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(exists)
    }
}
