//! Connector configuration documents.
//!
//! [`ConnectorConfig`] is an immutable value: construction happens once through
//! [`S3SinkSettings::build`] (or the `with` builder), and the only later change
//! is [`ConnectorConfig::with_topics`], which returns a new document.

use crate::{ConnectorResult, S3SinkSettings, TopicSet};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

pub const CONNECTOR_CLASS_KEY: &str = "connector.class";
pub const TOPICS_KEY: &str = "topics";

pub const S3_SINK_CONNECTOR_CLASS: &str = "io.confluent.connect.s3.S3SinkConnector";
const S3_STORAGE_CLASS: &str = "io.confluent.connect.s3.storage.S3Storage";
const PARQUET_FORMAT_CLASS: &str = "io.confluent.connect.s3.format.parquet.ParquetFormat";
const TIME_BASED_PARTITIONER_CLASS: &str =
    "io.confluent.connect.storage.partitioner.TimeBasedPartitioner";
const PATH_FORMAT: &str = "'year'=YYYY/'month'=MM/'day'=dd/'hour'=HH";

/// A single configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Str(String),
    Int(i64),
    List(Vec<String>),
}

impl ConfigValue {
    /// Kafka Connect takes every property as a string
    pub fn render(&self) -> String {
        match self {
            ConfigValue::Str(s) => s.clone(),
            ConfigValue::Int(i) => i.to_string(),
            ConfigValue::List(items) => items.join(","),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<u32> for ConfigValue {
    fn from(value: u32) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(value: Vec<String>) -> Self {
        ConfigValue::List(value)
    }
}

/// Desired state of a remote connector
///
/// Keys are kept sorted so two equal documents always render to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    entries: BTreeMap<String, ConfigValue>,
}

impl ConnectorConfig {
    /// Start a document for the given connector plugin class
    pub fn new(connector_class: impl Into<String>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            CONNECTOR_CLASS_KEY.to_string(),
            ConfigValue::Str(connector_class.into()),
        );
        Self { entries }
    }

    /// Builder-style setter used while constructing the base document
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Return a copy whose `topics` field holds exactly `topics`
    ///
    /// No other field is touched.
    pub fn with_topics(&self, topics: &TopicSet) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(
            TOPICS_KEY.to_string(),
            ConfigValue::List(topics.iter().map(str::to_string).collect()),
        );
        Self { entries }
    }

    pub fn connector_class(&self) -> &str {
        match self.entries.get(CONNECTOR_CLASS_KEY) {
            Some(ConfigValue::Str(class)) => class,
            _ => "",
        }
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Topics currently embedded in the document
    pub fn topics(&self) -> TopicSet {
        match self.entries.get(TOPICS_KEY) {
            Some(ConfigValue::List(items)) => items.iter().cloned().collect(),
            Some(ConfigValue::Str(joined)) => joined
                .split(',')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            _ => TopicSet::new(),
        }
    }

    /// Compact JSON, as sent to the Connect REST API
    pub fn to_json(&self) -> ConnectorResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented JSON, for showing to a user
    pub fn to_json_pretty(&self) -> ConnectorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for ConnectorConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, &value.render())?;
        }
        map.end()
    }
}

impl S3SinkSettings {
    /// Base document for the Confluent S3 sink, without topics
    pub fn build(&self) -> ConnectorConfig {
        ConnectorConfig::new(S3_SINK_CONNECTOR_CLASS)
            .with("name", self.name.as_str())
            .with("tasks.max", self.tasks_max)
            .with("s3.bucket.name", self.s3_bucket_name.as_str())
            .with("s3.region", self.s3_region.as_str())
            .with("topics.dir", self.topics_dir.as_str())
            .with("flush.size", saturating_i64(self.flush_size))
            .with("rotate.interval.ms", saturating_i64(self.rotate_interval_ms))
            .with("partition.duration.ms", saturating_i64(self.partition_duration_ms))
            .with("locale", self.locale.as_str())
            .with("timezone", self.timezone.as_str())
            .with("timestamp.extractor", self.timestamp_extractor.as_str())
            .with("timestamp.field", self.timestamp_field.as_str())
            .with("storage.class", S3_STORAGE_CLASS)
            .with("format.class", PARQUET_FORMAT_CLASS)
            .with("partitioner.class", TIME_BASED_PARTITIONER_CLASS)
            .with("path.format", PATH_FORMAT)
            .with("schema.compatibility", "NONE")
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
