//! Pure bankroll derivations: recommended stakes, exposure windows, limits,
//! and the monthly aggregate. Everything is a function of the fetched
//! settings/entries snapshot and an explicit `now`, recomputed on every read.

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::Serialize;

use crate::domain::entities::bankroll::{BankrollEntry, BankrollSettings, EntryStatus, RiskLevel};

/// Stake multiplier applied when smart risk adjustment is enabled.
fn risk_multiplier(risk: RiskLevel) -> f64 {
    match risk {
        RiskLevel::Low => 1.0,
        RiskLevel::Medium => 0.7,
        RiskLevel::High => 0.4,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureStatus {
    Green,
    Yellow,
    Red,
}

pub fn stake_base(settings: &BankrollSettings) -> f64 {
    settings.current_bankroll * settings.base_stake_percent / 100.0
}

/// Recommended stake for a wager at the given risk level.
pub fn adjusted_stake(settings: &BankrollSettings, risk: Option<RiskLevel>) -> f64 {
    let base = stake_base(settings);
    if !settings.smart_risk_adjustment {
        return base;
    }
    match risk {
        Some(r) => base * risk_multiplier(r),
        None => base,
    }
}

/// Sum of stakes committed during the current UTC calendar day.
pub fn exposure_today(entries: &[BankrollEntry], now: NaiveDateTime) -> f64 {
    entries
        .iter()
        .filter(|e| e.created_at.date() == now.date())
        .map(|e| e.stake)
        .sum()
}

/// Sum of stakes committed during the trailing 7 days.
pub fn exposure_week(entries: &[BankrollEntry], now: NaiveDateTime) -> f64 {
    let cutoff = now - Duration::days(7);
    entries
        .iter()
        .filter(|e| e.created_at >= cutoff && e.created_at <= now)
        .map(|e| e.stake)
        .sum()
}

/// Sum of stakes committed during the current calendar month.
pub fn exposure_month(entries: &[BankrollEntry], now: NaiveDateTime) -> f64 {
    entries
        .iter()
        .filter(|e| same_month(e.created_at, now))
        .map(|e| e.stake)
        .sum()
}

pub fn daily_limit(settings: &BankrollSettings) -> f64 {
    stake_base(settings) * 5.0
}

pub fn weekly_limit(settings: &BankrollSettings) -> f64 {
    stake_base(settings) * 20.0
}

/// An explicit user limit overrides the derived default.
pub fn monthly_limit(settings: &BankrollSettings) -> f64 {
    settings
        .monthly_exposure_limit
        .unwrap_or_else(|| stake_base(settings) * 60.0)
}

/// Traffic-light status for an exposure against its limit: green up to 80%,
/// yellow up to 100%, red beyond. A non-positive limit reads as green so an
/// unset bankroll never divides by zero.
pub fn exposure_status(exposure: f64, limit: f64) -> ExposureStatus {
    if limit <= 0.0 {
        return ExposureStatus::Green;
    }
    let ratio = exposure / limit;
    if ratio <= 0.8 {
        ExposureStatus::Green
    } else if ratio <= 1.0 {
        ExposureStatus::Yellow
    } else {
        ExposureStatus::Red
    }
}

/// Number of entries created during the current UTC calendar day.
pub fn entries_today(entries: &[BankrollEntry], now: NaiveDateTime) -> u32 {
    entries.iter().filter(|e| e.created_at.date() == now.date()).count() as u32
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub total_staked: f64,
    pub entry_count: u32,
    pub wins: u32,
    pub losses: u32,
    pub net_result: f64,
}

/// Aggregate over the current calendar month.
pub fn monthly_summary(entries: &[BankrollEntry], now: NaiveDateTime) -> MonthlySummary {
    let mut summary = MonthlySummary::default();
    for entry in entries.iter().filter(|e| same_month(e.created_at, now)) {
        summary.total_staked += entry.stake;
        summary.entry_count += 1;
        match entry.status {
            EntryStatus::Won => summary.wins += 1,
            EntryStatus::Lost => summary.losses += 1,
            EntryStatus::Open => {}
        }
        summary.net_result += entry.profit_loss;
    }
    summary
}

fn same_month(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
