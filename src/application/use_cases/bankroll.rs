use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::alerts::{self, Alert, AlertContext},
    application::exposure::{self, ExposureStatus, MonthlySummary},
    domain::entities::{
        bankroll::{BankrollEntry, BankrollSettings, BetType, EntryStatus, RiskLevel},
        plan::PlanTier,
    },
};

// ============================================================================
// Input / Output Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SaveSettingsInput {
    pub current_bankroll: f64,
    pub monthly_exposure_limit: Option<f64>,
    pub base_stake_percent: f64,
    pub smart_risk_adjustment: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEntryInput {
    pub stake: f64,
    pub odd_total: Option<f64>,
    pub bet_type: BetType,
    pub risk_level: Option<RiskLevel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExposureWindow {
    pub exposure: f64,
    pub limit: f64,
    pub status: ExposureStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendedStakes {
    pub base: f64,
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

/// Everything the dashboard needs in one read: derived stakes, exposure
/// windows with their traffic-light status, the month's aggregate, the
/// behavioral alerts, and whether the tier's daily quota allows another
/// entry.
#[derive(Debug, Clone, Serialize)]
pub struct BankrollOverview {
    pub recommended_stakes: RecommendedStakes,
    pub today: ExposureWindow,
    pub week: ExposureWindow,
    pub month: ExposureWindow,
    pub monthly_summary: MonthlySummary,
    pub alerts: Vec<Alert>,
    pub entries_today: u32,
    pub daily_entry_quota: Option<u32>,
    pub can_add_entry: bool,
}

// ============================================================================
// Repository Traits
// ============================================================================

#[async_trait]
pub trait BankrollSettingsRepo: Send + Sync {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<BankrollSettings>>;
    /// Insert on first save, update in place afterwards.
    async fn upsert(&self, settings: &BankrollSettings) -> AppResult<BankrollSettings>;
}

#[async_trait]
pub trait BankrollEntryRepo: Send + Sync {
    async fn create(&self, entry: &BankrollEntry) -> AppResult<BankrollEntry>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<BankrollEntry>>;
    /// All entries for a user, ordered by `created_at` ascending.
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<BankrollEntry>>;
    async fn update_settlement(&self, entry: &BankrollEntry) -> AppResult<BankrollEntry>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct BankrollUseCases {
    settings: Arc<dyn BankrollSettingsRepo>,
    entries: Arc<dyn BankrollEntryRepo>,
}

impl BankrollUseCases {
    pub fn new(
        settings: Arc<dyn BankrollSettingsRepo>,
        entries: Arc<dyn BankrollEntryRepo>,
    ) -> Self {
        Self { settings, entries }
    }

    pub async fn get_settings(&self, user_id: Uuid) -> AppResult<BankrollSettings> {
        self.settings
            .get_by_user_id(user_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn save_settings(
        &self,
        user_id: Uuid,
        input: SaveSettingsInput,
    ) -> AppResult<BankrollSettings> {
        if !input.current_bankroll.is_finite() || input.current_bankroll < 0.0 {
            return Err(AppError::InvalidInput("Bankroll cannot be negative".into()));
        }
        if !input.base_stake_percent.is_finite()
            || !(0.1..=10.0).contains(&input.base_stake_percent)
        {
            return Err(AppError::InvalidInput(
                "Base stake percent must be between 0.1 and 10".into(),
            ));
        }
        if let Some(limit) = input.monthly_exposure_limit {
            if !limit.is_finite() || limit < 0.0 {
                return Err(AppError::InvalidInput(
                    "Monthly exposure limit cannot be negative".into(),
                ));
            }
        }

        let existing = self.settings.get_by_user_id(user_id).await?;
        let settings = BankrollSettings {
            id: existing.as_ref().map(|s| s.id).unwrap_or_else(Uuid::new_v4),
            user_id,
            current_bankroll: input.current_bankroll,
            monthly_exposure_limit: input.monthly_exposure_limit,
            base_stake_percent: input.base_stake_percent,
            smart_risk_adjustment: input.smart_risk_adjustment,
            created_at: existing.as_ref().and_then(|s| s.created_at),
            updated_at: None,
        };
        self.settings.upsert(&settings).await
    }

    pub async fn list_entries(&self, user_id: Uuid) -> AppResult<Vec<BankrollEntry>> {
        self.entries.list_by_user(user_id).await
    }

    /// Record a new open wager, enforcing the tier's per-day entry quota.
    pub async fn add_entry(
        &self,
        user_id: Uuid,
        tier: PlanTier,
        input: NewEntryInput,
        now: NaiveDateTime,
    ) -> AppResult<BankrollEntry> {
        if !input.stake.is_finite() || input.stake <= 0.0 {
            return Err(AppError::InvalidInput("Stake must be positive".into()));
        }
        if let Some(odd) = input.odd_total {
            if !odd.is_finite() || odd < 1.0 {
                return Err(AppError::InvalidInput("Odds must be at least 1.0".into()));
            }
        }

        if let Some(quota) = tier.daily_entry_quota() {
            let existing = self.entries.list_by_user(user_id).await?;
            if exposure::entries_today(&existing, now) >= quota {
                return Err(AppError::InvalidInput(format!(
                    "Daily entry limit of {quota} reached for your plan"
                )));
            }
        }

        let entry = BankrollEntry {
            id: Uuid::new_v4(),
            user_id,
            stake: input.stake,
            odd_total: input.odd_total,
            bet_type: input.bet_type,
            status: EntryStatus::Open,
            risk_level: input.risk_level,
            profit_loss: 0.0,
            created_at: now,
        };
        self.entries.create(&entry).await
    }

    /// Settle an open entry as won or lost. Entries belong to exactly one
    /// user; foreign ids read as not found.
    pub async fn settle_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        outcome: EntryStatus,
    ) -> AppResult<BankrollEntry> {
        let mut entry = self
            .entries
            .get_by_id(entry_id)
            .await?
            .filter(|e| e.user_id == user_id)
            .ok_or(AppError::NotFound)?;
        entry.settle(outcome)?;
        self.entries.update_settlement(&entry).await
    }

    /// Recompute the full dashboard snapshot from current settings and entry
    /// history. Nothing here is cached; every read derives from scratch.
    pub async fn overview(
        &self,
        user_id: Uuid,
        tier: PlanTier,
        now: NaiveDateTime,
    ) -> AppResult<BankrollOverview> {
        let settings = self.get_settings(user_id).await?;
        let entries = self.entries.list_by_user(user_id).await?;

        let today = exposure::exposure_today(&entries, now);
        let week = exposure::exposure_week(&entries, now);
        let month = exposure::exposure_month(&entries, now);
        let daily_limit = exposure::daily_limit(&settings);
        let weekly_limit = exposure::weekly_limit(&settings);
        let monthly_limit = exposure::monthly_limit(&settings);

        let alerts = alerts::evaluate(&AlertContext {
            settings: &settings,
            entries: &entries,
            tier,
            now,
        });

        let entries_today = exposure::entries_today(&entries, now);
        let daily_entry_quota = tier.daily_entry_quota();
        let can_add_entry = daily_entry_quota.is_none_or(|quota| entries_today < quota);

        Ok(BankrollOverview {
            recommended_stakes: RecommendedStakes {
                base: exposure::stake_base(&settings),
                low: exposure::adjusted_stake(&settings, Some(RiskLevel::Low)),
                medium: exposure::adjusted_stake(&settings, Some(RiskLevel::Medium)),
                high: exposure::adjusted_stake(&settings, Some(RiskLevel::High)),
            },
            today: ExposureWindow {
                exposure: today,
                limit: daily_limit,
                status: exposure::exposure_status(today, daily_limit),
            },
            week: ExposureWindow {
                exposure: week,
                limit: weekly_limit,
                status: exposure::exposure_status(week, weekly_limit),
            },
            month: ExposureWindow {
                exposure: month,
                limit: monthly_limit,
                status: exposure::exposure_status(month, monthly_limit),
            },
            monthly_summary: exposure::monthly_summary(&entries, now),
            alerts,
            entries_today,
            daily_entry_quota,
            can_add_entry,
        })
    }
}
