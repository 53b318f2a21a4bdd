//! In-memory mock implementations for billing-related traits.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    application::use_cases::billing::{
        CreateSubscriptionEventInput, EntitlementRepo, GatewaySubscription, PaymentGateway,
        SubscriptionEventRepo, UserRepo,
    },
    domain::entities::{entitlement::Entitlement, user::User},
};

// ============================================================================
// InMemoryUserRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepo {
    pub users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserRepo {
    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

// ============================================================================
// InMemoryEntitlementRepo
// ============================================================================

/// Keyed by user id, mirroring the table's unique constraint.
#[derive(Default)]
pub struct InMemoryEntitlementRepo {
    pub entitlements: Mutex<HashMap<Uuid, Entitlement>>,
}

impl InMemoryEntitlementRepo {
    pub fn insert(&self, entitlement: Entitlement) {
        self.entitlements
            .lock()
            .unwrap()
            .insert(entitlement.user_id, entitlement);
    }

    /// Synchronous peek for assertions.
    pub fn stored(&self, user_id: Uuid) -> Option<Entitlement> {
        self.entitlements.lock().unwrap().get(&user_id).cloned()
    }
}

#[async_trait]
impl EntitlementRepo for InMemoryEntitlementRepo {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Entitlement>> {
        Ok(self.entitlements.lock().unwrap().get(&user_id).cloned())
    }

    async fn get_by_stripe_customer_id(
        &self,
        stripe_customer_id: &str,
    ) -> AppResult<Option<Entitlement>> {
        Ok(self
            .entitlements
            .lock()
            .unwrap()
            .values()
            .find(|e| e.stripe_customer_id.as_deref() == Some(stripe_customer_id))
            .cloned())
    }

    async fn upsert(&self, entitlement: &Entitlement) -> AppResult<Entitlement> {
        let mut entitlements = self.entitlements.lock().unwrap();
        let now = Utc::now().naive_utc();

        let mut stored = entitlement.clone();
        if let Some(existing) = entitlements.get(&entitlement.user_id) {
            // The conflict target is user_id; the original row id survives.
            stored.id = existing.id;
            stored.created_at = existing.created_at;
        } else {
            stored.created_at = Some(now);
        }
        stored.updated_at = Some(now);

        entitlements.insert(stored.user_id, stored.clone());
        Ok(stored)
    }
}

// ============================================================================
// InMemorySubscriptionEventRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionEventRepo {
    pub events: Mutex<Vec<CreateSubscriptionEventInput>>,
}

impl InMemorySubscriptionEventRepo {
    pub fn all(&self) -> Vec<CreateSubscriptionEventInput> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionEventRepo for InMemorySubscriptionEventRepo {
    async fn create(&self, input: &CreateSubscriptionEventInput) -> AppResult<()> {
        self.events.lock().unwrap().push(input.clone());
        Ok(())
    }

    async fn exists_by_stripe_event_id(&self, stripe_event_id: &str) -> AppResult<bool> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.stripe_event_id.as_deref() == Some(stripe_event_id)))
    }
}

// ============================================================================
// MockPaymentGateway
// ============================================================================

/// Fake payment provider. Counts customer creations and serves a configurable
/// subscription snapshot for checkout enrichment.
pub struct MockPaymentGateway {
    customers: Mutex<Vec<Uuid>>,
    pub subscription_state: Mutex<GatewaySubscription>,
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self {
            customers: Mutex::new(Vec::new()),
            subscription_state: Mutex::new(GatewaySubscription {
                status: "active".to_string(),
                price_id: Some("price_pro".to_string()),
                current_period_end: Some(Utc::now().naive_utc() + Duration::days(30)),
                cancel_at_period_end: false,
            }),
        }
    }
}

impl MockPaymentGateway {
    pub fn customers_created(&self) -> usize {
        self.customers.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn ensure_customer(&self, user_id: Uuid, _email: &str) -> AppResult<String> {
        let mut customers = self.customers.lock().unwrap();
        customers.push(user_id);
        Ok(format!("cus_mock_{}", customers.len()))
    }

    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        _user_id: Uuid,
        _plan_key: &str,
    ) -> AppResult<String> {
        Ok(format!(
            "https://checkout.stripe.test/{}/{}",
            customer_id, price_id
        ))
    }

    async fn customer_email(&self, _customer_id: &str) -> AppResult<Option<String>> {
        Ok(None)
    }

    async fn subscription(&self, _subscription_id: &str) -> AppResult<GatewaySubscription> {
        Ok(self.subscription_state.lock().unwrap().clone())
    }
}
