//! Behavioral risk alerts over a user's entry history.
//!
//! Each detector is an independent pure rule `fn(&AlertContext) -> Option<Alert>`;
//! evaluation walks the ordered rule list and concatenates every hit, so rules
//! can be added and tested in isolation.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::application::exposure;
use crate::domain::entities::bankroll::{BankrollEntry, BankrollSettings, BetType, EntryStatus};
use crate::domain::entities::plan::PlanTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    DailyExposureExceeded,
    StakeAboveRecommended,
    RecoveryPattern,
    MultipleBetFrequency,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Snapshot the rules evaluate over. `entries` must be sorted ascending by
/// `created_at` (the last element is the most recent wager).
pub struct AlertContext<'a> {
    pub settings: &'a BankrollSettings,
    pub entries: &'a [BankrollEntry],
    pub tier: PlanTier,
    pub now: NaiveDateTime,
}

type AlertRule = fn(&AlertContext<'_>) -> Option<Alert>;

/// Rules in display order. Every applicable alert is returned, not just the
/// first.
static ALERT_RULES: &[AlertRule] = &[
    daily_exposure_rule,
    stake_above_recommended_rule,
    recovery_pattern_rule,
    multiple_bet_frequency_rule,
];

pub fn evaluate(ctx: &AlertContext<'_>) -> Vec<Alert> {
    ALERT_RULES.iter().filter_map(|rule| rule(ctx)).collect()
}

/// Exposure for the current day above the daily limit. Available on every
/// tier; escalated from warning to danger for paid tiers.
fn daily_exposure_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    let limit = exposure::daily_limit(ctx.settings);
    let today = exposure::exposure_today(ctx.entries, ctx.now);
    if limit <= 0.0 || today <= limit {
        return None;
    }
    let severity = if ctx.tier.is_paid() {
        AlertSeverity::Danger
    } else {
        AlertSeverity::Warning
    };
    Some(Alert {
        kind: AlertKind::DailyExposureExceeded,
        severity,
        message: format!(
            "Today's exposure ({today:.2}) is above your daily limit ({limit:.2})"
        ),
    })
}

/// Most recent stake well above the recommended base stake. Paid tiers only.
fn stake_above_recommended_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    if !ctx.tier.is_paid() {
        return None;
    }
    let base = exposure::stake_base(ctx.settings);
    let latest = ctx.entries.last()?;
    if base <= 0.0 || latest.stake <= base * 1.5 {
        return None;
    }
    Some(Alert {
        kind: AlertKind::StakeAboveRecommended,
        severity: AlertSeverity::Warning,
        message: format!(
            "Last stake ({:.2}) exceeds 1.5x your recommended base stake ({base:.2})",
            latest.stake
        ),
    })
}

/// Loss-chasing detector: several recent losses in the last 24 hours followed
/// by a sharply increased stake. Pro/elite only.
fn recovery_pattern_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    if !ctx.tier.has_pattern_detection() {
        return None;
    }
    let cutoff = ctx.now - Duration::hours(24);
    let window: Vec<&BankrollEntry> =
        ctx.entries.iter().filter(|e| e.created_at >= cutoff).collect();
    if window.len() < 3 {
        return None;
    }

    let recent_losses = window[window.len() - 3..]
        .iter()
        .filter(|e| e.status == EntryStatus::Lost)
        .count();
    if recent_losses < 2 {
        return None;
    }

    let latest = window[window.len() - 1];
    let earlier = &window[..window.len() - 1];
    let avg_stake: f64 = earlier.iter().map(|e| e.stake).sum::<f64>() / earlier.len() as f64;
    if latest.stake <= avg_stake * 1.5 {
        return None;
    }

    Some(Alert {
        kind: AlertKind::RecoveryPattern,
        severity: AlertSeverity::Danger,
        message: "Recent losses followed by a much larger stake look like loss chasing"
            .to_string(),
    })
}

/// High share of multiple (accumulator) bets over the last week. Pro/elite only.
fn multiple_bet_frequency_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    if !ctx.tier.has_pattern_detection() {
        return None;
    }
    let cutoff = ctx.now - Duration::days(7);
    let window: Vec<&BankrollEntry> =
        ctx.entries.iter().filter(|e| e.created_at >= cutoff).collect();
    if window.len() < 5 {
        return None;
    }
    let multiples = window.iter().filter(|e| e.bet_type == BetType::Multiple).count();
    if (multiples as f64) / (window.len() as f64) < 0.7 {
        return None;
    }
    Some(Alert {
        kind: AlertKind::MultipleBetFrequency,
        severity: AlertSeverity::Warning,
        message: format!(
            "{multiples} of your last {} bets were multiples; singles carry less variance",
            window.len()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::bankroll::RiskLevel;
    use chrono::Utc;
    use uuid::Uuid;

    fn settings(bankroll: f64, percent: f64) -> BankrollSettings {
        BankrollSettings {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            current_bankroll: bankroll,
            monthly_exposure_limit: None,
            base_stake_percent: percent,
            smart_risk_adjustment: false,
            created_at: None,
            updated_at: None,
        }
    }

    fn entry(
        now: NaiveDateTime,
        hours_ago: i64,
        stake: f64,
        status: EntryStatus,
        bet_type: BetType,
    ) -> BankrollEntry {
        BankrollEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            stake,
            odd_total: Some(2.0),
            bet_type,
            status,
            risk_level: Some(RiskLevel::Medium),
            profit_loss: 0.0,
            created_at: now - Duration::hours(hours_ago),
        }
    }

    fn now() -> NaiveDateTime {
        // Midday so "hours ago" entries stay within the same calendar day.
        Utc::now().date_naive().and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn free_tier_over_daily_limit_yields_exactly_one_warning() {
        // stake_base = 20, daily limit = 100, exposure today = 120
        let s = settings(1000.0, 2.0);
        let now = now();
        let entries = vec![
            entry(now, 3, 60.0, EntryStatus::Open, BetType::Single),
            entry(now, 1, 60.0, EntryStatus::Open, BetType::Single),
        ];
        let ctx = AlertContext { settings: &s, entries: &entries, tier: PlanTier::Free, now };
        let alerts = evaluate(&ctx);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::DailyExposureExceeded);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
    }

    #[test]
    fn paid_tier_escalates_daily_exposure_to_danger() {
        let s = settings(1000.0, 2.0);
        let now = now();
        let entries = vec![
            entry(now, 3, 60.0, EntryStatus::Open, BetType::Single),
            entry(now, 1, 60.0, EntryStatus::Open, BetType::Single),
        ];
        let ctx = AlertContext { settings: &s, entries: &entries, tier: PlanTier::Pro, now };
        let alerts = evaluate(&ctx);
        let exposure = alerts
            .iter()
            .find(|a| a.kind == AlertKind::DailyExposureExceeded)
            .unwrap();
        assert_eq!(exposure.severity, AlertSeverity::Danger);
        // 60 > 1.5 * 20, so the recommended-stake warning fires as well
        assert!(alerts.iter().any(|a| a.kind == AlertKind::StakeAboveRecommended));
    }

    #[test]
    fn stake_above_recommended_is_paid_only() {
        let s = settings(1000.0, 2.0); // base 20
        let now = now();
        let entries = vec![entry(now, 1, 31.0, EntryStatus::Open, BetType::Single)];
        let free = AlertContext { settings: &s, entries: &entries, tier: PlanTier::Free, now };
        assert!(evaluate(&free).is_empty());
        let basic = AlertContext { settings: &s, entries: &entries, tier: PlanTier::Basic, now };
        let alerts = evaluate(&basic);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::StakeAboveRecommended);
    }

    #[test]
    fn recovery_pattern_requires_losses_and_escalated_stake() {
        let s = settings(10_000.0, 2.0); // base 200, daily limit 1000
        let now = now();
        // Two losses at 50, then a 120 stake: 120 > 1.5 * avg(50, 50) = 75
        let entries = vec![
            entry(now, 5, 50.0, EntryStatus::Lost, BetType::Single),
            entry(now, 3, 50.0, EntryStatus::Lost, BetType::Single),
            entry(now, 1, 120.0, EntryStatus::Open, BetType::Single),
        ];
        let ctx = AlertContext { settings: &s, entries: &entries, tier: PlanTier::Elite, now };
        let alerts = evaluate(&ctx);
        assert!(alerts.iter().any(|a| {
            a.kind == AlertKind::RecoveryPattern && a.severity == AlertSeverity::Danger
        }));
    }

    #[test]
    fn recovery_pattern_is_hidden_from_basic_tier() {
        let s = settings(10_000.0, 2.0);
        let now = now();
        let entries = vec![
            entry(now, 5, 50.0, EntryStatus::Lost, BetType::Single),
            entry(now, 3, 50.0, EntryStatus::Lost, BetType::Single),
            entry(now, 1, 120.0, EntryStatus::Open, BetType::Single),
        ];
        let ctx = AlertContext { settings: &s, entries: &entries, tier: PlanTier::Basic, now };
        assert!(!evaluate(&ctx).iter().any(|a| a.kind == AlertKind::RecoveryPattern));
    }

    #[test]
    fn recovery_pattern_needs_a_stake_jump() {
        let s = settings(10_000.0, 2.0);
        let now = now();
        // Losses but the follow-up stake is not escalated
        let entries = vec![
            entry(now, 5, 50.0, EntryStatus::Lost, BetType::Single),
            entry(now, 3, 50.0, EntryStatus::Lost, BetType::Single),
            entry(now, 1, 60.0, EntryStatus::Open, BetType::Single),
        ];
        let ctx = AlertContext { settings: &s, entries: &entries, tier: PlanTier::Pro, now };
        assert!(!evaluate(&ctx).iter().any(|a| a.kind == AlertKind::RecoveryPattern));
    }

    #[test]
    fn multiple_bet_frequency_needs_five_entries_and_seventy_percent() {
        let s = settings(100_000.0, 2.0); // limits high enough to stay quiet
        let now = now();
        let mut entries: Vec<BankrollEntry> = (0..4)
            .map(|i| entry(now, 40 + i, 10.0, EntryStatus::Open, BetType::Multiple))
            .collect();
        entries.push(entry(now, 30, 10.0, EntryStatus::Open, BetType::Single));

        // 4 of 5 multiples = 80%
        let ctx = AlertContext { settings: &s, entries: &entries, tier: PlanTier::Pro, now };
        assert!(evaluate(&ctx).iter().any(|a| a.kind == AlertKind::MultipleBetFrequency));

        // Dropping one multiple leaves 3 of 4 under the entry minimum
        entries.remove(0);
        let ctx = AlertContext { settings: &s, entries: &entries, tier: PlanTier::Pro, now };
        assert!(!evaluate(&ctx).iter().any(|a| a.kind == AlertKind::MultipleBetFrequency));
    }
}
