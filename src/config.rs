//! Configuration management for the sync tool.

use crate::{ConnectorError, ConnectorResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Settings shared by every command: where the Connect worker and Kafka live,
/// how topics are selected, and how the reconciliation loop behaves.
///
/// # Structure
/// - **Endpoints**: `connect_url`, `broker_url`
/// - **Topic selection**: `topic_regex`, `excluded_topics`
/// - **Loop and transport**: `check_interval_ms`, `request_timeout_ms`, `retry`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Kafka Connect REST endpoint (KAFKA_CONNECT_URL)
    #[serde(default = "default_connect_url")]
    pub connect_url: String,

    /// Kafka bootstrap servers, comma separated (KAFKA_BROKER_URL)
    #[serde(default = "default_broker_url")]
    pub broker_url: String,

    /// Regex a topic name must fully match to be exported (KAFKA_CONNECT_TOPIC_REGEX)
    #[serde(default = "default_topic_regex")]
    pub topic_regex: String,

    /// Comma separated topic names never exported (KAFKA_CONNECT_EXCLUDED_TOPICS)
    #[serde(default)]
    pub excluded_topics: String,

    /// Period of the auto-update loop in milliseconds (KAFKA_CONNECT_CHECK_INTERVAL)
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,

    /// Timeout applied to each Connect REST request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Upper bound on one topic discovery, connection included
    #[serde(default = "default_discovery_timeout_ms")]
    pub discovery_timeout_ms: u64,

    /// Log level used when RUST_LOG is not set (KAFKA_CONNECT_LOG_LEVEL)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Retry settings for Connect REST calls
    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_connect_url() -> String {
    "http://localhost:8083".to_string()
}
fn default_broker_url() -> String {
    "localhost:9092".to_string()
}
fn default_topic_regex() -> String {
    ".*".to_string()
}
fn default_check_interval_ms() -> u64 {
    15000
}
fn default_request_timeout_ms() -> u64 {
    30000
}
fn default_discovery_timeout_ms() -> u64 {
    10000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl SyncConfig {
    /// Build a configuration from defaults overridden by environment variables
    pub fn from_env() -> ConnectorResult<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> ConnectorResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConnectorError::config(format!("Failed to read config file {}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            ConnectorError::config(format!("Failed to parse config file {}: {}", path, e))
        })
    }

    /// Apply environment variable overrides on top of the current values
    pub fn apply_env_overrides(&mut self) -> ConnectorResult<()> {
        if let Ok(val) = env::var("KAFKA_CONNECT_URL") {
            self.connect_url = val;
        }
        if let Ok(val) = env::var("KAFKA_BROKER_URL") {
            self.broker_url = val;
        }
        if let Ok(val) = env::var("KAFKA_CONNECT_TOPIC_REGEX") {
            self.topic_regex = val;
        }
        if let Ok(val) = env::var("KAFKA_CONNECT_EXCLUDED_TOPICS") {
            self.excluded_topics = val;
        }
        if let Ok(val) = env::var("KAFKA_CONNECT_CHECK_INTERVAL") {
            self.check_interval_ms = parse_env("KAFKA_CONNECT_CHECK_INTERVAL", &val)?;
        }
        if let Ok(val) = env::var("KAFKA_CONNECT_LOG_LEVEL") {
            self.log_level = val;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.connect_url.is_empty() {
            return Err(ConnectorError::config("connect_url cannot be empty"));
        }

        if self.broker_url.is_empty() {
            return Err(ConnectorError::config("broker_url cannot be empty"));
        }

        if self.check_interval_ms == 0 {
            return Err(ConnectorError::config("check_interval_ms must be > 0"));
        }

        if self.discovery_timeout_ms == 0 {
            return Err(ConnectorError::config("discovery_timeout_ms must be > 0"));
        }

        if self.retry.max_retries > 100 {
            return Err(ConnectorError::config("max_retries too high (max 100)"));
        }

        Regex::new(&self.topic_regex).map_err(|e| {
            ConnectorError::config(format!("invalid topic_regex {:?}: {}", self.topic_regex, e))
        })?;

        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            connect_url: default_connect_url(),
            broker_url: default_broker_url(),
            topic_regex: default_topic_regex(),
            excluded_topics: String::new(),
            check_interval_ms: default_check_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            discovery_timeout_ms: default_discovery_timeout_ms(),
            log_level: default_log_level(),
            retry: RetrySettings::default(),
        }
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> ConnectorResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConnectorError::config(format!("{} has an invalid value {:?}: {}", name, value, e)))
}

/// Retry configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Maximum number of retries for failed operations
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff duration in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Maximum backoff duration in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    1000
}
fn default_max_backoff_ms() -> u64 {
    30000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff_ms: 1000,
            max_backoff_ms: 30000,
        }
    }
}

/// Options of the Confluent S3 sink connector
///
/// Turned into a [`crate::ConnectorConfig`] by [`S3SinkSettings::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3SinkSettings {
    /// Connector name, unique on the Connect cluster
    pub name: String,
    /// Target bucket, must exist already
    pub s3_bucket_name: String,
    pub s3_region: String,
    /// Top level directory for the exported data
    pub topics_dir: String,
    /// Records written per file before a commit
    pub flush_size: u64,
    pub rotate_interval_ms: u64,
    /// Partition duration used by the time based partitioner
    pub partition_duration_ms: u64,
    pub tasks_max: u32,
    pub locale: String,
    pub timezone: String,
    /// Wallclock, Record or RecordField
    pub timestamp_extractor: String,
    pub timestamp_field: String,
}

impl Default for S3SinkSettings {
    fn default() -> Self {
        Self {
            name: "s3-sink".to_string(),
            s3_bucket_name: String::new(),
            s3_region: "us-east-1".to_string(),
            topics_dir: "topics".to_string(),
            flush_size: 3600,
            rotate_interval_ms: 600_000,
            partition_duration_ms: 3_600_000,
            tasks_max: 1,
            locale: "en-US".to_string(),
            timezone: "UTC".to_string(),
            timestamp_extractor: "Record".to_string(),
            timestamp_field: "time".to_string(),
        }
    }
}
