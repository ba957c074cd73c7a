//! Seams to the external systems.
//!
//! This module defines the two traits the reconciliation core talks through:
//! - `TopicDiscoverer`: produces the set of topics that should be exported
//! - `ConnectGateway`: validates and upserts connector configurations on a Connect cluster
//!
//! Production implementations are [`crate::KafkaTopicDiscoverer`] and
//! [`crate::RestConnectGateway`]; tests substitute in-memory fakes.

use crate::{ConnectorConfig, ConnectorResult, TopicSet};
use async_trait::async_trait;

/// Source of the desired topic set
///
/// # Example
///
/// ```rust,no_run
/// use kafka_connect_sink::{ConnectorResult, TopicDiscoverer, TopicSet};
/// use async_trait::async_trait;
///
/// pub struct StaticTopics(Vec<String>);
///
/// #[async_trait]
/// impl TopicDiscoverer for StaticTopics {
///     async fn names(&self) -> ConnectorResult<TopicSet> {
///         Ok(self.0.iter().cloned().collect())
///     }
/// }
/// ```
#[async_trait]
pub trait TopicDiscoverer: Send + Sync {
    /// Return the topics that currently match the selection criteria
    ///
    /// # Errors
    ///
    /// Return `ConnectorError::Discovery` when the metadata source cannot be reached
    async fn names(&self) -> ConnectorResult<TopicSet>;
}

/// Client for the Kafka Connect control-plane API
///
/// Implementations own transport concerns: timeouts, retries of transient
/// failures and translation of HTTP statuses into [`crate::ConnectorError`].
#[async_trait]
pub trait ConnectGateway: Send + Sync {
    /// Ask the cluster to validate `config` against the plugin `connector_class`
    ///
    /// Returns the raw response body. Interpreting it is the caller's job, see
    /// [`crate::ValidationResult::parse`].
    async fn validate(&self, connector_class: &str, config: &ConnectorConfig)
        -> ConnectorResult<String>;

    /// Create the connector `name` if absent, otherwise replace its configuration
    ///
    /// # Errors
    ///
    /// Return `ConnectorError::Retryable` for transport failures and 5xx responses
    /// Return `ConnectorError::Fatal` for rejected requests
    async fn upsert(&self, name: &str, config: &ConnectorConfig) -> ConnectorResult<()>;
}

#[async_trait]
impl<T: TopicDiscoverer + ?Sized> TopicDiscoverer for std::sync::Arc<T> {
    async fn names(&self) -> ConnectorResult<TopicSet> {
        (**self).names().await
    }
}

#[async_trait]
impl<T: ConnectGateway + ?Sized> ConnectGateway for std::sync::Arc<T> {
    async fn validate(
        &self,
        connector_class: &str,
        config: &ConnectorConfig,
    ) -> ConnectorResult<String> {
        (**self).validate(connector_class, config).await
    }

    async fn upsert(&self, name: &str, config: &ConnectorConfig) -> ConnectorResult<()> {
        (**self).upsert(name, config).await
    }
}
