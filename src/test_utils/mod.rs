//! Test utilities.
//!
//! This module provides:
//! - Test data factories for creating valid fixtures
//! - In-memory implementations of the repository, cache and provider ports
//! - Harnesses that wire use cases against those in-memory pieces

mod app_state_builder;
mod billing_mocks;
mod factories;
mod provider_mocks;

pub use app_state_builder::*;
pub use billing_mocks::*;
pub use factories::*;
pub use harness::*;
pub use provider_mocks::*;
