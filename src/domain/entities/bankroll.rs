use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "bet_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BetType {
    Single,
    Multiple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entry_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Open,
    Won,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "risk_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Per-user bankroll configuration, upserted in place on save.
#[derive(Debug, Clone, Serialize)]
pub struct BankrollSettings {
    pub id: Uuid,
    pub user_id: Uuid,
    pub current_bankroll: f64,
    pub monthly_exposure_limit: Option<f64>,
    pub base_stake_percent: f64,
    pub smart_risk_adjustment: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// A single wager. `profit_loss` stays 0 while open and is set exactly once
/// by [`BankrollEntry::settle`].
#[derive(Debug, Clone, Serialize)]
pub struct BankrollEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub stake: f64,
    pub odd_total: Option<f64>,
    pub bet_type: BetType,
    pub status: EntryStatus,
    pub risk_level: Option<RiskLevel>,
    pub profit_loss: f64,
    pub created_at: NaiveDateTime,
}

impl BankrollEntry {
    /// Transition an open entry to won or lost, computing the profit/loss:
    /// won pays `stake * (odd_total - 1)` (0 when odds were never recorded),
    /// lost costs the full stake.
    pub fn settle(&mut self, outcome: EntryStatus) -> AppResult<()> {
        if self.status != EntryStatus::Open {
            return Err(AppError::InvalidInput("Entry is already settled".into()));
        }
        self.profit_loss = match outcome {
            EntryStatus::Won => self.odd_total.map(|odd| self.stake * (odd - 1.0)).unwrap_or(0.0),
            EntryStatus::Lost => -self.stake,
            EntryStatus::Open => {
                return Err(AppError::InvalidInput("Cannot settle an entry as open".into()));
            }
        };
        self.status = outcome;
        Ok(())
    }
}
