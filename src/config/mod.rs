//! Configuration and shared types
//!
//! Error taxonomy, apartment options, and process-wide reporting settings.

pub mod loader;
pub mod types;

pub use loader::{release_failure_level, set_release_failure_level, GuardConfig};
