use serde::{Deserialize, Serialize};

/// Subscription tier gating feature access.
///
/// Stored in Postgres as the `plan_tier` enum and used verbatim as the JSON
/// plan key, so there is exactly one representation of a tier in the system.
/// External strings (webhook payloads, stored rows) are converted at the
/// boundary via [`PlanTier::from_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "plan_tier", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Basic,
    Pro,
    Elite,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Basic => "basic",
            PlanTier::Pro => "pro",
            PlanTier::Elite => "elite",
        }
    }

    /// Unknown plan keys degrade to the free tier rather than failing open.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "basic" => PlanTier::Basic,
            "pro" => PlanTier::Pro,
            "elite" => PlanTier::Elite,
            _ => PlanTier::Free,
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, PlanTier::Free)
    }

    /// Pattern detectors (recovery chasing, multiple-bet frequency) run only
    /// on the higher tiers.
    pub fn has_pattern_detection(&self) -> bool {
        matches!(self, PlanTier::Pro | PlanTier::Elite)
    }

    /// Maximum bankroll entries per calendar day. `None` means unlimited.
    pub fn daily_entry_quota(&self) -> Option<u32> {
        match self {
            PlanTier::Free => Some(3),
            PlanTier::Basic => Some(10),
            PlanTier::Pro => Some(30),
            PlanTier::Elite => None,
        }
    }
}
