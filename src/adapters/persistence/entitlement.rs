use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::billing::EntitlementRepo,
    domain::entities::entitlement::Entitlement,
};

fn row_to_entitlement(row: sqlx::postgres::PgRow) -> Entitlement {
    Entitlement {
        id: row.get("id"),
        user_id: row.get("user_id"),
        plan: row.get("plan"),
        status: row.get("status"),
        stripe_customer_id: row.get("stripe_customer_id"),
        stripe_subscription_id: row.get("stripe_subscription_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, user_id, plan, status, stripe_customer_id, stripe_subscription_id,
    expires_at, created_at, updated_at
"#;

#[async_trait]
impl EntitlementRepo for PostgresPersistence {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Entitlement>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM entitlements WHERE user_id = $1",
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_entitlement))
    }

    async fn get_by_stripe_customer_id(
        &self,
        stripe_customer_id: &str,
    ) -> AppResult<Option<Entitlement>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM entitlements WHERE stripe_customer_id = $1",
            SELECT_COLS
        ))
        .bind(stripe_customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_entitlement))
    }

    async fn upsert(&self, entitlement: &Entitlement) -> AppResult<Entitlement> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO entitlements
                (id, user_id, plan, status, stripe_customer_id, stripe_subscription_id, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                plan = EXCLUDED.plan,
                status = EXCLUDED.status,
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                expires_at = EXCLUDED.expires_at,
                updated_at = now()
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(entitlement.id)
        .bind(entitlement.user_id)
        .bind(entitlement.plan)
        .bind(entitlement.status)
        .bind(&entitlement.stripe_customer_id)
        .bind(&entitlement.stripe_subscription_id)
        .bind(entitlement.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_entitlement(row))
    }
}
