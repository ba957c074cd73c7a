//! In-memory fakes for the discovery and Connect seams.

#![allow(dead_code)]

use async_trait::async_trait;
use kafka_connect_sink::{
    ConnectGateway, ConnectorConfig, ConnectorError, ConnectorResult, TopicDiscoverer, TopicSet,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn topics(names: &[&str]) -> TopicSet {
    names.iter().copied().collect()
}

/// A recorded gateway call with the exact JSON payload sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Validate { class: String, body: String },
    Upsert { name: String, body: String },
}

pub struct FakeGateway {
    calls: Mutex<Vec<Call>>,
    validation_body: Mutex<String>,
    failing_upserts: AtomicUsize,
}

impl FakeGateway {
    /// Gateway whose validation reports `error_count` errors
    pub fn with_error_count(error_count: u64) -> Self {
        Self::with_validation_body(format!(
            r#"{{"name":"io.confluent.connect.s3.S3SinkConnector","error_count":{},"configs":[]}}"#,
            error_count
        ))
    }

    pub fn with_validation_body(body: impl Into<String>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            validation_body: Mutex::new(body.into()),
            failing_upserts: AtomicUsize::new(0),
        }
    }

    /// Make the next `n` upserts fail with a retryable error
    pub fn fail_next_upserts(&self, n: usize) {
        self.failing_upserts.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn upserts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Upsert { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    /// Topics carried by the n-th upsert
    pub fn upserted_topics(&self, n: usize) -> String {
        let body: serde_json::Value = serde_json::from_str(&self.upserts()[n]).unwrap();
        body["topics"].as_str().unwrap().to_string()
    }
}

#[async_trait]
impl ConnectGateway for FakeGateway {
    async fn validate(
        &self,
        connector_class: &str,
        config: &ConnectorConfig,
    ) -> ConnectorResult<String> {
        self.calls.lock().unwrap().push(Call::Validate {
            class: connector_class.to_string(),
            body: config.to_json()?,
        });
        Ok(self.validation_body.lock().unwrap().clone())
    }

    async fn upsert(&self, name: &str, config: &ConnectorConfig) -> ConnectorResult<()> {
        self.calls.lock().unwrap().push(Call::Upsert {
            name: name.to_string(),
            body: config.to_json()?,
        });

        let failing = self.failing_upserts.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_upserts.store(failing - 1, Ordering::SeqCst);
            return Err(ConnectorError::retryable("connect worker unavailable"));
        }
        Ok(())
    }
}

/// Discoverer that replays a script of results, then repeats the last set
pub struct FakeDiscoverer {
    script: Mutex<VecDeque<ConnectorResult<TopicSet>>>,
    last: Mutex<TopicSet>,
    calls: AtomicUsize,
}

impl FakeDiscoverer {
    pub fn new(initial: TopicSet) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(initial),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn then(self, next: TopicSet) -> Self {
        self.script.lock().unwrap().push_back(Ok(next));
        self
    }

    pub fn then_fail(self) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(ConnectorError::discovery("broker unreachable")));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TopicDiscoverer for FakeDiscoverer {
    async fn names(&self) -> ConnectorResult<TopicSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(set)) => {
                *self.last.lock().unwrap() = set.clone();
                Ok(set)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}
