use crate::{
    adapters::http::app_state::AppState,
    application::price_map::PricePlanMap,
    application::use_cases::{
        bankroll::{BankrollEntryRepo, BankrollSettingsRepo, BankrollUseCases},
        billing::{BillingUseCases, EntitlementRepo, PaymentGateway, SubscriptionEventRepo, UserRepo},
    },
    domain::entities::plan::PlanTier,
    infra::{config::AppConfig, postgres_persistence, stripe_client::StripeClient},
};
use secrecy::ExposeSecret;
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);

    let stripe = Arc::new(StripeClient::new(
        config.stripe_secret_key.expose_secret().to_string(),
        config.checkout_success_url.clone(),
        config.checkout_cancel_url.clone(),
    ));

    let prices = PricePlanMap::new([
        (config.price_basic.clone(), PlanTier::Basic),
        (config.price_pro.clone(), PlanTier::Pro),
        (config.price_elite.clone(), PlanTier::Elite),
    ]);

    let billing_use_cases = BillingUseCases::new(
        postgres_arc.clone() as Arc<dyn UserRepo>,
        postgres_arc.clone() as Arc<dyn EntitlementRepo>,
        postgres_arc.clone() as Arc<dyn SubscriptionEventRepo>,
        stripe as Arc<dyn PaymentGateway>,
        prices,
    );

    let bankroll_use_cases = BankrollUseCases::new(
        postgres_arc.clone() as Arc<dyn BankrollSettingsRepo>,
        postgres_arc as Arc<dyn BankrollEntryRepo>,
    );

    Ok(AppState {
        config: Arc::new(config),
        billing_use_cases: Arc::new(billing_use_cases),
        bankroll_use_cases: Arc::new(bankroll_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "betanalizer_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
