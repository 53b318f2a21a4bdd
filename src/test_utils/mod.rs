//! Test utilities for integration testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository implementations for mocking persistence
//! - A builder for constructing `AppState` with test dependencies

pub mod app_state_builder;
pub mod bankroll_mocks;
pub mod billing_mocks;
pub mod factories;

pub use app_state_builder::*;
pub use bankroll_mocks::*;
pub use billing_mocks::*;
pub use factories::*;
