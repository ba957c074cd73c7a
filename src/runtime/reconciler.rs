//! Periodic reconciliation of the connector topic list.
//!
//! Every `check_interval` the reconciler re-discovers topics and compares them
//! with the last applied set. Only growth triggers an upsert, and the upsert
//! always carries the full discovered set. Topics that disappear are never
//! removed from the connector.

use crate::utils::{HealthChecker, HealthStatus};
use crate::{
    ConnectGateway, ConnectorConfig, ReconcileMetrics, ReconciliationController,
    TopicDiscoverer, TopicSet,
};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the next tick
    Idle,
    /// Discovery, diff and possibly an upsert in progress
    Reconciling,
    /// Shut down, `run` has returned
    Stopped,
}

/// The last topic set the remote connector confirmed
///
/// Only replaced after a successful upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationState {
    last_applied: TopicSet,
}

impl ReconciliationState {
    pub fn new(last_applied: TopicSet) -> Self {
        Self { last_applied }
    }

    pub fn last_applied(&self) -> &TopicSet {
        &self.last_applied
    }
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No topic outside the last applied set, no remote call made
    Unchanged,
    /// New topics found and the full set upserted
    Applied { added: TopicSet },
    /// Discovery failed, nothing else attempted
    DiscoveryFailed,
    /// New topics found but the upsert failed; they are retried next tick
    ApplyFailed { added: TopicSet },
}

/// Topics in `current` that have not been applied yet
pub fn diff(current: &TopicSet, last_applied: &TopicSet) -> TopicSet {
    current.difference(last_applied)
}

/// The auto-update loop
///
/// Create with `Reconciler::new()` after a successful commit and run with
/// `.run(shutdown).await`. Ticks are strictly sequential.
pub struct Reconciler<D: TopicDiscoverer, G: ConnectGateway> {
    controller: ReconciliationController<G>,
    discoverer: D,
    name: String,
    base_config: ConnectorConfig,
    state: ReconciliationState,
    loop_state: LoopState,
    check_interval: Duration,
    metrics: ReconcileMetrics,
    health: HealthChecker,
}

impl<D: TopicDiscoverer, G: ConnectGateway> Reconciler<D, G> {
    pub fn new(
        controller: ReconciliationController<G>,
        discoverer: D,
        name: impl Into<String>,
        base_config: ConnectorConfig,
        state: ReconciliationState,
        check_interval: Duration,
    ) -> Self {
        let name = name.into();
        let metrics = ReconcileMetrics::new(&name);
        metrics.set_applied_topics(state.last_applied().len());

        Self {
            controller,
            discoverer,
            name,
            base_config,
            state,
            loop_state: LoopState::Idle,
            check_interval,
            metrics,
            health: HealthChecker::default(),
        }
    }

    pub fn state(&self) -> &ReconciliationState {
        &self.state
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    pub fn health(&self) -> HealthStatus {
        self.health.status()
    }

    /// Run one discover, diff and (maybe) upsert step
    pub async fn tick(&mut self) -> TickOutcome {
        self.metrics.record_tick();

        let current = match self.discoverer.names().await {
            Ok(current) => current,
            Err(e) => {
                warn!("Topic discovery failed, retrying next tick: {}", e);
                self.metrics.record_failure("discovery");
                self.record_health(false);
                return TickOutcome::DiscoveryFailed;
            }
        };

        let added = diff(&current, self.state.last_applied());
        if added.is_empty() {
            debug!("No new topics ({} discovered)", current.len());
            self.record_health(true);
            return TickOutcome::Unchanged;
        }

        self.loop_state = LoopState::Reconciling;
        info!("Found new topics {}, updating the connector", added);

        let start = Instant::now();
        let config = self.base_config.with_topics(&current);
        let result = self.controller.upsert(&self.name, &config).await;
        self.loop_state = LoopState::Idle;

        match result {
            Ok(()) => {
                self.metrics.record_reconcile_time(start.elapsed());
                self.metrics.record_upsert(current.len());
                self.state = ReconciliationState::new(current);
                self.record_health(true);
                TickOutcome::Applied { added }
            }
            Err(e) => {
                error!("Failed to update connector {}: {}", self.name, e);
                self.metrics.record_failure("upsert");
                self.record_health(false);
                TickOutcome::ApplyFailed { added }
            }
        }
    }

    /// Tick every `check_interval` until `shutdown` is cancelled
    ///
    /// The first tick fires one full interval after the call. Cancellation is
    /// observed between ticks; a tick in progress always runs to completion.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        info!(
            "Checking for new topics every {:?} for connector {}",
            self.check_interval, self.name
        );

        // tokio intervals reject a zero period
        let period = self.check_interval.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        self.loop_state = LoopState::Stopped;
        info!("Reconciliation loop for {} stopped", self.name);
    }

    fn record_health(&mut self, ok: bool) {
        let previous = if ok {
            self.health.record_success()
        } else {
            self.health.record_failure()
        };

        match (previous, self.health.status()) {
            (HealthStatus::Unhealthy, HealthStatus::Healthy) => {
                info!("Connector {} reconciliation recovered", self.name)
            }
            (HealthStatus::Healthy | HealthStatus::Degraded, HealthStatus::Unhealthy) => warn!(
                "Connector {} reconciliation failing: {} consecutive failed checks, last success {:?} ago",
                self.name,
                self.health.consecutive_failures(),
                self.health.time_since_last_success()
            ),
            _ => {}
        }
    }
}
