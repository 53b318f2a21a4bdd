use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::bankroll::BankrollSettingsRepo,
    domain::entities::bankroll::BankrollSettings,
};

fn row_to_settings(row: sqlx::postgres::PgRow) -> BankrollSettings {
    BankrollSettings {
        id: row.get("id"),
        user_id: row.get("user_id"),
        current_bankroll: row.get("current_bankroll"),
        monthly_exposure_limit: row.get("monthly_exposure_limit"),
        base_stake_percent: row.get("base_stake_percent"),
        smart_risk_adjustment: row.get("smart_risk_adjustment"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, user_id, current_bankroll, monthly_exposure_limit, base_stake_percent,
    smart_risk_adjustment, created_at, updated_at
"#;

#[async_trait]
impl BankrollSettingsRepo for PostgresPersistence {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<BankrollSettings>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM bankroll_settings WHERE user_id = $1",
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_settings))
    }

    async fn upsert(&self, settings: &BankrollSettings) -> AppResult<BankrollSettings> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO bankroll_settings
                (id, user_id, current_bankroll, monthly_exposure_limit,
                 base_stake_percent, smart_risk_adjustment)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                current_bankroll = EXCLUDED.current_bankroll,
                monthly_exposure_limit = EXCLUDED.monthly_exposure_limit,
                base_stake_percent = EXCLUDED.base_stake_percent,
                smart_risk_adjustment = EXCLUDED.smart_risk_adjustment,
                updated_at = now()
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(settings.id)
        .bind(settings.user_id)
        .bind(settings.current_bankroll)
        .bind(settings.monthly_exposure_limit)
        .bind(settings.base_stake_percent)
        .bind(settings.smart_risk_adjustment)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_settings(row))
    }
}
