pub mod bankroll;
pub mod entitlement;
pub mod plan;
pub mod user;
