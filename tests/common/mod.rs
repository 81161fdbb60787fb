//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fixtures;
pub mod recorder;

#[allow(unused_imports)]
pub use fixtures::{release_date, TestEnvironment, BUYER_ID, OPERATOR_ID};
#[allow(unused_imports)]
pub use recorder::{RecordingMessenger, Sent};
