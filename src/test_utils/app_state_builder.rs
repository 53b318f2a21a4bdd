//! Test app state builder for HTTP-level integration testing.
//!
//! Builds a minimal `AppState` backed by in-memory mocks, returning the mock
//! handles so tests can seed and inspect state directly.

use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;
use url::Url;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        jwt,
        price_map::PricePlanMap,
        use_cases::{
            bankroll::{BankrollEntryRepo, BankrollSettingsRepo, BankrollUseCases},
            billing::{
                BillingUseCases, EntitlementRepo, PaymentGateway, SubscriptionEventRepo, UserRepo,
            },
        },
    },
    domain::entities::{entitlement::Entitlement, plan::PlanTier, user::User},
    infra::config::AppConfig,
    test_utils::{
        InMemoryBankrollEntryRepo, InMemoryBankrollSettingsRepo, InMemoryEntitlementRepo,
        InMemorySubscriptionEventRepo, InMemoryUserRepo, MockPaymentGateway,
    },
};

pub const TEST_JWT_SECRET: &str = "test_jwt_secret";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Handles to the mocks behind a test `AppState`.
pub struct TestMocks {
    pub users: Arc<InMemoryUserRepo>,
    pub entitlements: Arc<InMemoryEntitlementRepo>,
    pub events: Arc<InMemorySubscriptionEventRepo>,
    pub gateway: Arc<MockPaymentGateway>,
    pub bankroll_settings: Arc<InMemoryBankrollSettingsRepo>,
    pub bankroll_entries: Arc<InMemoryBankrollEntryRepo>,
}

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let user = create_test_user();
/// let (app_state, mocks) = TestAppStateBuilder::new().with_user(user).build();
/// ```
#[derive(Default)]
pub struct TestAppStateBuilder {
    users: Vec<User>,
    entitlements: Vec<Entitlement>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_entitlement(mut self, entitlement: Entitlement) -> Self {
        self.entitlements.push(entitlement);
        self
    }

    pub fn build(self) -> (AppState, TestMocks) {
        let users = Arc::new(InMemoryUserRepo::default());
        let entitlements = Arc::new(InMemoryEntitlementRepo::default());
        let events = Arc::new(InMemorySubscriptionEventRepo::default());
        let gateway = Arc::new(MockPaymentGateway::default());
        let bankroll_settings = Arc::new(InMemoryBankrollSettingsRepo::default());
        let bankroll_entries = Arc::new(InMemoryBankrollEntryRepo::default());

        for user in self.users {
            users.insert(user);
        }
        for entitlement in self.entitlements {
            entitlements.insert(entitlement);
        }

        let prices = PricePlanMap::new([
            ("price_basic".to_string(), PlanTier::Basic),
            ("price_pro".to_string(), PlanTier::Pro),
            ("price_elite".to_string(), PlanTier::Elite),
        ]);

        let billing_use_cases = BillingUseCases::new(
            users.clone() as Arc<dyn UserRepo>,
            entitlements.clone() as Arc<dyn EntitlementRepo>,
            events.clone() as Arc<dyn SubscriptionEventRepo>,
            gateway.clone() as Arc<dyn PaymentGateway>,
            prices,
        );
        let bankroll_use_cases = BankrollUseCases::new(
            bankroll_settings.clone() as Arc<dyn BankrollSettingsRepo>,
            bankroll_entries.clone() as Arc<dyn BankrollEntryRepo>,
        );

        let app_state = AppState {
            config: Arc::new(test_config()),
            billing_use_cases: Arc::new(billing_use_cases),
            bankroll_use_cases: Arc::new(bankroll_use_cases),
        };

        let mocks = TestMocks {
            users,
            entitlements,
            events,
            gateway,
            bankroll_settings,
            bankroll_entries,
        };
        (app_state, mocks)
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        access_token_ttl: Duration::hours(24),
        app_origin: Url::parse("http://localhost:3000/").unwrap(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        stripe_secret_key: SecretString::new("sk_test_123".into()),
        stripe_webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
        checkout_success_url: "http://localhost:3000/billing/success".to_string(),
        checkout_cancel_url: "http://localhost:3000/billing".to_string(),
        price_basic: "price_basic".to_string(),
        price_pro: "price_pro".to_string(),
        price_elite: "price_elite".to_string(),
    }
}

/// A valid `Authorization` header value for the given user.
pub fn bearer_token(user_id: Uuid) -> String {
    let secret = SecretString::new(TEST_JWT_SECRET.into());
    let token = jwt::issue(user_id, &secret, Duration::hours(1)).unwrap();
    format!("Bearer {}", token)
}
