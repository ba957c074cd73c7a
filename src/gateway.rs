//! Kafka Connect REST client.
//!
//! Implements [`ConnectGateway`] over the worker's REST API:
//! - validate: `PUT /connector-plugins/{class}/config/validate`
//! - upsert: `PUT /connectors/{name}/config`
//!
//! Transient failures (transport errors, 5xx, 408, 409 during a worker
//! rebalance, 429) are retried with exponential backoff. Everything else is
//! returned as a fatal error carrying the response body.

use crate::retry::{RetryConfig, RetryStrategy};
use crate::{ConnectGateway, ConnectorConfig, ConnectorError, ConnectorResult, SyncConfig};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// [`ConnectGateway`] backed by the Kafka Connect REST API
#[derive(Debug, Clone)]
pub struct RestConnectGateway {
    base_url: Url,
    http_client: reqwest::Client,
    retry_strategy: RetryStrategy,
}

impl RestConnectGateway {
    /// Create a gateway with default timeout and retry settings
    pub fn new(connect_url: &str) -> ConnectorResult<Self> {
        Self::build(connect_url, Duration::from_secs(30), RetryConfig::default())
    }

    /// Create a gateway from the shared configuration
    pub fn from_config(config: &SyncConfig) -> ConnectorResult<Self> {
        Self::build(
            &config.connect_url,
            Duration::from_millis(config.request_timeout_ms),
            RetryConfig::from(&config.retry),
        )
    }

    /// Disable retries, every failure is returned on the first attempt
    pub fn without_retries(mut self) -> Self {
        self.retry_strategy = RetryStrategy::new(RetryConfig::none());
        self
    }

    fn build(connect_url: &str, timeout: Duration, retry: RetryConfig) -> ConnectorResult<Self> {
        let parsed = Url::parse(connect_url).map_err(|e| {
            ConnectorError::config(format!("invalid connect_url {:?}: {}", connect_url, e))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ConnectorError::config(format!(
                "invalid connect_url {:?}: not an http endpoint",
                connect_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectorError::fatal_with_source("Failed to build HTTP client", e))?;

        Ok(Self {
            base_url: parsed,
            http_client,
            retry_strategy: RetryStrategy::new(retry),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn validate_url(&self, connector_class: &str) -> ConnectorResult<Url> {
        self.endpoint(&["connector-plugins", connector_class, "config", "validate"])
    }

    fn config_url(&self, name: &str) -> ConnectorResult<Url> {
        self.endpoint(&["connectors", name, "config"])
    }

    /// Append `segments` to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> ConnectorResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConnectorError::config(format!("cannot extend {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// PUT `config` to `url` and return the body of a successful response
    async fn put(&self, url: &Url, config: &ConnectorConfig) -> ConnectorResult<String> {
        debug!("PUT {}", url);
        let response = self.http_client.put(url.clone()).json(config).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = format!("PUT {} returned {}: {}", url, status, body);
        if is_transient(status) {
            Err(ConnectorError::retryable(message))
        } else {
            Err(ConnectorError::fatal(message))
        }
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, mut call: F) -> ConnectorResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ConnectorResult<T>>,
    {
        let mut attempt = 0;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && self.retry_strategy.should_retry(attempt) => {
                    attempt += 1;
                    let backoff = self.retry_strategy.calculate_backoff(attempt);
                    warn!(
                        "{} retry attempt {} after {:?} - error: {}",
                        operation, attempt, backoff, e
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::CONFLICT
        || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl ConnectGateway for RestConnectGateway {
    async fn validate(
        &self,
        connector_class: &str,
        config: &ConnectorConfig,
    ) -> ConnectorResult<String> {
        let url = self.validate_url(connector_class)?;
        let url = &url;
        self.with_retry("validate", move || self.put(url, config))
            .await
    }

    async fn upsert(&self, name: &str, config: &ConnectorConfig) -> ConnectorResult<()> {
        let url = self.config_url(name)?;
        let url = &url;
        self.with_retry("upsert", move || self.put(url, config))
            .await
            .map(|_| ())
    }
}
