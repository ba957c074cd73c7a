//! Topic sets and topic discovery.
//!
//! A [`TopicSet`] is what the connector should currently export. It is produced
//! either from an explicit list or by a [`crate::TopicDiscoverer`], and is always
//! replaced wholesale, never patched.

use crate::{ConnectorError, ConnectorResult, SyncConfig, TopicDiscoverer};
use async_trait::async_trait;
use regex::Regex;
use rskafka::client::ClientBuilder;
use rskafka::BackoffConfig;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

/// Unordered set of topic names, unique by name
///
/// Backed by a `BTreeSet` so iteration (and therefore the rendered `topics`
/// field) is always sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicSet(BTreeSet<String>);

impl TopicSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.0.contains(topic)
    }

    /// Topics in `self` that are not in `other`
    pub fn difference(&self, other: &TopicSet) -> TopicSet {
        self.0.difference(&other.0).cloned().collect()
    }

    pub fn is_subset(&self, other: &TopicSet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Sorted iterator over the topic names
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Comma-joined sorted list, the form Kafka Connect expects
    pub fn joined(&self) -> String {
        self.iter().collect::<Vec<_>>().join(",")
    }
}

impl<S: Into<String>> FromIterator<S> for TopicSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        TopicSet(iter.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for TopicSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.joined())
    }
}

/// Inclusion regex plus a verbatim exclusion list
#[derive(Debug, Clone)]
pub struct TopicFilter {
    include: Regex,
    excluded: BTreeSet<String>,
}

impl TopicFilter {
    /// Build a filter from a regex and a comma-delimited exclusion list
    ///
    /// The regex must match the whole topic name. Exclusions are compared as
    /// plain names, not patterns.
    pub fn new(topic_regex: &str, excluded_topics: &str) -> ConnectorResult<Self> {
        let include = Regex::new(&format!("^(?:{})$", topic_regex)).map_err(|e| {
            ConnectorError::config(format!("invalid topic regex {:?}: {}", topic_regex, e))
        })?;

        let excluded = excluded_topics
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self { include, excluded })
    }

    pub fn matches(&self, topic: &str) -> bool {
        self.include.is_match(topic) && !self.excluded.contains(topic)
    }

    /// Keep only the names that pass the filter
    pub fn apply<I, S>(&self, names: I) -> TopicSet
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .map(Into::into)
            .filter(|name| self.matches(name))
            .collect()
    }
}

/// Discovers topics by asking a Kafka cluster for its metadata
///
/// Topics the broker flags as internal (`__consumer_offsets`,
/// `__transaction_state`) are never reported. Other names, including ones
/// with a leading underscore such as `_schemas`, go through the filter.
#[derive(Debug, Clone)]
pub struct KafkaTopicDiscoverer {
    brokers: Vec<String>,
    filter: TopicFilter,
    timeout: Duration,
}

impl KafkaTopicDiscoverer {
    /// Create a discoverer for a comma separated bootstrap server list
    pub fn new(broker_url: &str, filter: TopicFilter) -> ConnectorResult<Self> {
        let brokers: Vec<String> = broker_url
            .split(',')
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .collect();

        if brokers.is_empty() {
            return Err(ConnectorError::config("broker_url cannot be empty"));
        }

        Ok(Self {
            brokers,
            filter,
            timeout: Duration::from_secs(10),
        })
    }

    /// Create a discoverer from the shared configuration
    pub fn from_config(config: &SyncConfig) -> ConnectorResult<Self> {
        let filter = TopicFilter::new(&config.topic_regex, &config.excluded_topics)?;
        Ok(Self::new(&config.broker_url, filter)?
            .with_timeout(Duration::from_millis(config.discovery_timeout_ms)))
    }

    /// Bound a whole discovery, connection and metadata request included
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn filter(&self) -> &TopicFilter {
        &self.filter
    }
}

#[async_trait]
impl TopicDiscoverer for KafkaTopicDiscoverer {
    async fn names(&self) -> ConnectorResult<TopicSet> {
        // rskafka retries broker requests forever without a deadline
        let backoff = BackoffConfig {
            deadline: Some(self.timeout),
            ..Default::default()
        };

        let discovery = async {
            // No client is kept between calls.
            let client = ClientBuilder::new(self.brokers.clone())
                .backoff_config(backoff)
                .build()
                .await
                .map_err(|e| {
                    ConnectorError::discovery(format!(
                        "failed to connect to {}: {}",
                        self.brokers.join(","),
                        e
                    ))
                })?;

            client
                .list_topics()
                .await
                .map_err(|e| ConnectorError::discovery(format!("failed to list topics: {}", e)))
        };

        let topics = tokio::time::timeout(self.timeout, discovery)
            .await
            .map_err(|_| {
                ConnectorError::discovery(format!(
                    "no answer from {} after {:?}",
                    self.brokers.join(","),
                    self.timeout
                ))
            })??;

        debug!("Broker reported {} topic(s)", topics.len());

        Ok(self.filter.apply(topics.into_iter().map(|t| t.name)))
    }
}
