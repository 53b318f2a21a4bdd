use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::plan::PlanTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entitlement_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntitlementStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Expired,
}

impl EntitlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntitlementStatus::Active => "active",
            EntitlementStatus::Trialing => "trialing",
            EntitlementStatus::PastDue => "past_due",
            EntitlementStatus::Canceled => "canceled",
            EntitlementStatus::Expired => "expired",
        }
    }

    /// Convert from a Stripe subscription status string.
    /// Unknown statuses map to Expired - never grant access by default.
    pub fn from_stripe(s: &str) -> Self {
        match s {
            "active" => EntitlementStatus::Active,
            "trialing" => EntitlementStatus::Trialing,
            "past_due" => EntitlementStatus::PastDue,
            "canceled" => EntitlementStatus::Canceled,
            _ => EntitlementStatus::Expired,
        }
    }
}

/// The persisted record of which tier and status a user currently has.
///
/// Written only by the webhook reconciler; client code reads it for feature
/// gating. `expires_at` is set whenever status is active, trialing, or a
/// grace-period cancellation.
#[derive(Debug, Clone)]
pub struct Entitlement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: PlanTier,
    pub status: EntitlementStatus,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub expires_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Entitlement {
    /// A fresh free-tier entitlement, the state every user starts in.
    pub fn free(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            plan: PlanTier::Free,
            status: EntitlementStatus::Active,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            expires_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Whether paid features are accessible at `now`.
    ///
    /// Canceled subscriptions keep access until the already-paid period ends
    /// (grace period).
    pub fn has_access(&self, now: NaiveDateTime) -> bool {
        match self.status {
            EntitlementStatus::Active | EntitlementStatus::Trialing => true,
            EntitlementStatus::Canceled => self.expires_at.is_some_and(|end| now < end),
            EntitlementStatus::PastDue | EntitlementStatus::Expired => false,
        }
    }

    /// The tier feature gating should apply at `now`: the paid plan while
    /// access holds, free otherwise.
    pub fn effective_tier(&self, now: NaiveDateTime) -> PlanTier {
        if self.has_access(now) {
            self.plan
        } else {
            PlanTier::Free
        }
    }
}
