use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::bankroll::BankrollEntryRepo,
    domain::entities::bankroll::BankrollEntry,
};

fn row_to_entry(row: sqlx::postgres::PgRow) -> BankrollEntry {
    BankrollEntry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        stake: row.get("stake"),
        odd_total: row.get("odd_total"),
        bet_type: row.get("bet_type"),
        status: row.get("status"),
        risk_level: row.get("risk_level"),
        profit_loss: row.get("profit_loss"),
        created_at: row.get("created_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, user_id, stake, odd_total, bet_type, status, risk_level,
    profit_loss, created_at
"#;

#[async_trait]
impl BankrollEntryRepo for PostgresPersistence {
    async fn create(&self, entry: &BankrollEntry) -> AppResult<BankrollEntry> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO bankroll_entries
                (id, user_id, stake, odd_total, bet_type, status, risk_level,
                 profit_loss, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.stake)
        .bind(entry.odd_total)
        .bind(entry.bet_type)
        .bind(entry.status)
        .bind(entry.risk_level)
        .bind(entry.profit_loss)
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_entry(row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<BankrollEntry>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM bankroll_entries WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_entry))
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<BankrollEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM bankroll_entries WHERE user_id = $1 ORDER BY created_at ASC",
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_entry).collect())
    }

    async fn update_settlement(&self, entry: &BankrollEntry) -> AppResult<BankrollEntry> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE bankroll_entries
            SET status = $2, profit_loss = $3
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(entry.id)
        .bind(entry.status)
        .bind(entry.profit_loss)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_entry(row))
    }
}
