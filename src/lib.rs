//! # Kafka Connect Sink
//!
//! Create a Kafka Connect S3 sink connector and keep its topic list in sync
//! with the topics on a Kafka cluster.
//!
//! ## Overview
//!
//! The library is split along the two external systems it talks to:
//! - **Discovery**: a [`TopicDiscoverer`] lists the topics that should be exported
//! - **Control plane**: a [`ConnectGateway`] validates and upserts connector configurations
//!
//! [`ReconciliationController`] performs the first apply (validate, dry-run or
//! commit). With auto-update enabled, a [`Reconciler`] then re-discovers topics
//! every check interval and upserts the connector with the full topic set
//! whenever new topics appear.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kafka_connect_sink::{
//!     ApplyMode, KafkaTopicDiscoverer, ReconciliationController, RestConnectGateway,
//!     S3SinkSettings, SyncConfig, TopicDiscoverer,
//! };
//!
//! # async fn example() -> kafka_connect_sink::ConnectorResult<()> {
//! let config = SyncConfig::from_env()?;
//! let settings = S3SinkSettings {
//!     s3_bucket_name: "my-archive".to_string(),
//!     ..Default::default()
//! };
//!
//! let topics = KafkaTopicDiscoverer::from_config(&config)?.names().await?;
//! let controller = ReconciliationController::new(RestConnectGateway::from_config(&config)?);
//! let outcome = controller
//!     .apply(&settings.name, &settings.build(), &topics, ApplyMode::Commit)
//!     .await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Fail-closed commits**: nothing is upserted unless the cluster validates the configuration
//! - **Growth-only reconciliation**: new topics are added, removed topics are left in place
//! - **Built-in Retry Logic**: exponential backoff for transient REST failures
//! - **Observability**: structured logging via `tracing`, counters via `metrics`

pub mod cli;
mod config;
mod connector;
mod error;
mod gateway;
mod metrics;
mod retry;
mod runtime;
mod topics;
mod traits;
mod validation;
pub mod utils;

// Re-export public API
pub use config::{RetrySettings, S3SinkSettings, SyncConfig};
pub use connector::{ConfigValue, ConnectorConfig, S3_SINK_CONNECTOR_CLASS};
pub use error::{ConnectorError, ConnectorResult};
pub use gateway::RestConnectGateway;
pub use metrics::ReconcileMetrics;
pub use runtime::{
    diff, init_tracing, ApplyMode, ApplyOutcome, LoopState, ReconciliationController,
    ReconciliationState, Reconciler, TickOutcome,
};
pub use topics::{KafkaTopicDiscoverer, TopicFilter, TopicSet};
pub use traits::{ConnectGateway, TopicDiscoverer};
pub use utils::{HealthChecker, HealthStatus};
pub use validation::{ConfigValidation, FieldValidation, ValidationResult};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
