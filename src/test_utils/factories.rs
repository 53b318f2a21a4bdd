//! Test data factories for creating valid test fixtures.

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    bankroll::{BankrollEntry, BankrollSettings, BetType, EntryStatus, RiskLevel},
    user::User,
};

fn test_datetime() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Create a test user with a unique email.
pub fn create_test_user() -> User {
    let id = Uuid::new_v4();
    User {
        id,
        email: format!("user-{}@example.com", id.simple()),
        created_at: Some(test_datetime()),
    }
}

/// Create test bankroll settings with sensible defaults.
pub fn create_test_settings(
    user_id: Uuid,
    overrides: impl FnOnce(&mut BankrollSettings),
) -> BankrollSettings {
    let mut settings = BankrollSettings {
        id: Uuid::new_v4(),
        user_id,
        current_bankroll: 1000.0,
        monthly_exposure_limit: None,
        base_stake_percent: 2.0,
        smart_risk_adjustment: true,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut settings);
    settings
}

/// Create an open test entry with sensible defaults.
pub fn create_test_entry(
    user_id: Uuid,
    overrides: impl FnOnce(&mut BankrollEntry),
) -> BankrollEntry {
    let mut entry = BankrollEntry {
        id: Uuid::new_v4(),
        user_id,
        stake: 20.0,
        odd_total: Some(2.0),
        bet_type: BetType::Single,
        status: EntryStatus::Open,
        risk_level: Some(RiskLevel::Low),
        profit_loss: 0.0,
        created_at: test_datetime(),
    };
    overrides(&mut entry);
    entry
}
