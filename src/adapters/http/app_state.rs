use std::sync::Arc;

use crate::{
    application::use_cases::{bankroll::BankrollUseCases, billing::BillingUseCases},
    infra::config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub billing_use_cases: Arc<BillingUseCases>,
    pub bankroll_use_cases: Arc<BankrollUseCases>,
}
