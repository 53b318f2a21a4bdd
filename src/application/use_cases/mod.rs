pub mod bankroll;
pub mod billing;
