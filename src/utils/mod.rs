//! Utility modules for the reconciliation runtime.

pub mod health;

pub use health::{HealthChecker, HealthStatus};
