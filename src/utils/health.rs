//! Health tracking for the reconciliation loop.

use std::time::{Duration, Instant};

/// Health status derived from consecutive failed ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Last tick succeeded
    Healthy,
    /// Some ticks failed, fewer than the threshold
    Degraded,
    /// At least `failure_threshold` ticks failed in a row
    Unhealthy,
}

/// Counts consecutive failed ticks
///
/// A tick fails when discovery or the upsert fails. Ticks that find no new
/// topics count as successes.
#[derive(Debug)]
pub struct HealthChecker {
    status: HealthStatus,
    consecutive_failures: usize,
    last_success: Instant,
    failure_threshold: usize,
}

impl HealthChecker {
    pub fn new(failure_threshold: usize) -> Self {
        Self {
            status: HealthStatus::Healthy,
            consecutive_failures: 0,
            last_success: Instant::now(),
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// Record a successful tick, returning the previous status
    pub fn record_success(&mut self) -> HealthStatus {
        let previous = self.status;
        self.consecutive_failures = 0;
        self.last_success = Instant::now();
        self.status = HealthStatus::Healthy;
        previous
    }

    /// Record a failed tick, returning the previous status
    pub fn record_failure(&mut self) -> HealthStatus {
        let previous = self.status;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        self.status = if self.consecutive_failures >= self.failure_threshold {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };
        previous
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn consecutive_failures(&self) -> usize {
        self.consecutive_failures
    }

    /// Time since the last successful tick, or since creation if none succeeded
    pub fn time_since_last_success(&self) -> Duration {
        self.last_success.elapsed()
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new(3)
    }
}
