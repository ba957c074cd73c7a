//! Runtime for managing the connector lifecycle.
//!
//! - `ReconciliationController`: one-shot apply (validate, dry-run or commit)
//! - `Reconciler`: the periodic loop that re-discovers topics and upserts the
//!   connector whenever new ones appear
//!
//! The runtime handles:
//! - Validation gating before the first upsert
//! - Topic diffing against the last applied set
//! - Health and metrics for every tick
//! - Graceful shutdown

mod controller;
mod reconciler;

pub use controller::{ApplyMode, ApplyOutcome, ReconciliationController};
pub use reconciler::{diff, LoopState, ReconciliationState, Reconciler, TickOutcome};

/// Initialize tracing/logging
///
/// `RUST_LOG` wins over `log_level`. Safe to call more than once.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .ok(); // Ignore if already initialized
}
