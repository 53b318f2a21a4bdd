use std::collections::HashMap;

use crate::domain::entities::plan::PlanTier;

/// Immutable association between Stripe price ids and internal tiers,
/// constructed once at startup from config.
///
/// Lookups of unrecognized price ids return [`PlanTier::Free`]: a
/// misconfigured price downgrades rather than granting paid access.
#[derive(Debug, Clone, Default)]
pub struct PricePlanMap {
    by_price: HashMap<String, PlanTier>,
}

impl PricePlanMap {
    pub fn new(pairs: impl IntoIterator<Item = (String, PlanTier)>) -> Self {
        Self {
            by_price: pairs.into_iter().collect(),
        }
    }

    pub fn plan_for(&self, price_id: &str) -> PlanTier {
        self.by_price.get(price_id).copied().unwrap_or(PlanTier::Free)
    }

    /// Whether the price id is one of the configured paid prices.
    pub fn is_known(&self, price_id: &str) -> bool {
        self.by_price.contains_key(price_id)
    }
}
