//! The s3-sink command end to end, with fakes standing in for Kafka and Connect.

mod common;

use async_trait::async_trait;
use clap::Parser;
use common::{topics, FakeDiscoverer, FakeGateway};
use kafka_connect_sink::cli::{Cli, Command, S3SinkArgs};
use kafka_connect_sink::{ConnectorResult, SyncConfig, TopicDiscoverer, TopicSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A broker that never answers
struct StalledDiscoverer;

#[async_trait]
impl TopicDiscoverer for StalledDiscoverer {
    async fn names(&self) -> ConnectorResult<TopicSet> {
        std::future::pending::<ConnectorResult<TopicSet>>().await
    }
}

fn args(argv: &[&str]) -> S3SinkArgs {
    let mut full = vec!["kafka-connect-sink", "s3-sink"];
    full.extend_from_slice(argv);
    let Command::S3Sink(args) = Cli::try_parse_from(full).unwrap().command;
    args
}

#[tokio::test]
async fn test_explicit_topics_skip_discovery() {
    let discoverer = Arc::new(FakeDiscoverer::new(topics(&["ignored"])));
    let gateway = Arc::new(FakeGateway::with_error_count(0));

    let ok = args(&["a", "b"])
        .execute(
            &SyncConfig::default(),
            discoverer.clone(),
            gateway.clone(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(ok);
    assert_eq!(discoverer.calls(), 0);
    assert_eq!(gateway.upserted_topics(0), "a,b");
}

#[tokio::test]
async fn test_discovered_topics_are_committed() {
    let discoverer = Arc::new(FakeDiscoverer::new(topics(&["t1", "t2"])));
    let gateway = Arc::new(FakeGateway::with_error_count(0));

    let ok = args(&["--bucket-name", "archive"])
        .execute(
            &SyncConfig::default(),
            discoverer.clone(),
            gateway.clone(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(ok);
    assert_eq!(discoverer.calls(), 1);
    assert_eq!(gateway.upserted_topics(0), "t1,t2");
}

#[tokio::test]
async fn test_rejected_validation_reports_failure() {
    let discoverer = Arc::new(FakeDiscoverer::new(topics(&[])));
    let gateway = Arc::new(FakeGateway::with_error_count(1));

    let ok = args(&["a"])
        .execute(
            &SyncConfig::default(),
            discoverer,
            gateway.clone(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(!ok);
    assert!(gateway.upserts().is_empty());
}

#[tokio::test]
async fn test_garbled_validation_reports_failure() {
    let discoverer = Arc::new(FakeDiscoverer::new(topics(&[])));
    let gateway = Arc::new(FakeGateway::with_validation_body("Service Unavailable"));

    let ok = args(&["a"])
        .execute(
            &SyncConfig::default(),
            discoverer,
            gateway.clone(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(!ok);
    assert!(gateway.upserts().is_empty());
}

#[tokio::test]
async fn test_dry_run_with_auto_update_does_not_loop() {
    let discoverer = Arc::new(FakeDiscoverer::new(topics(&["a", "b"])));
    let gateway = Arc::new(FakeGateway::with_error_count(0));

    // a never-cancelled token: returning proves the loop was not entered
    let ok = args(&["a", "--dry-run", "--auto-update"])
        .execute(
            &SyncConfig::default(),
            discoverer.clone(),
            gateway.clone(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(ok);
    assert!(gateway.calls().is_empty());
    assert_eq!(discoverer.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_auto_update_picks_up_new_topics() {
    let discoverer = Arc::new(FakeDiscoverer::new(topics(&["a", "b", "c"])));
    let gateway = Arc::new(FakeGateway::with_error_count(0));
    let config = SyncConfig {
        check_interval_ms: 100,
        ..Default::default()
    };

    let shutdown = CancellationToken::new();
    let task = tokio::spawn({
        let (discoverer, gateway, shutdown) = (discoverer.clone(), gateway.clone(), shutdown.clone());
        async move {
            args(&["a", "b", "--auto-update"])
                .execute(&config, discoverer, gateway, shutdown)
                .await
        }
    });

    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    shutdown.cancel();
    assert!(task.await.unwrap().unwrap());

    assert_eq!(discoverer.calls(), 2);
    let upserts = gateway.upserts();
    assert_eq!(upserts.len(), 2);
    assert_eq!(gateway.upserted_topics(0), "a,b");
    assert_eq!(gateway.upserted_topics(1), "a,b,c");
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_during_discovery_ends_the_command() {
    let gateway = Arc::new(FakeGateway::with_error_count(0));
    let shutdown = CancellationToken::new();

    let task = tokio::spawn({
        let (gateway, shutdown) = (gateway.clone(), shutdown.clone());
        async move {
            args(&["--auto-update"])
                .execute(&SyncConfig::default(), StalledDiscoverer, gateway, shutdown)
                .await
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();

    let ok = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("command kept running after the interrupt")
        .unwrap()
        .unwrap();

    assert!(!ok);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_interrupt_before_apply_sends_nothing() {
    let discoverer = Arc::new(FakeDiscoverer::new(topics(&["a"])));
    let gateway = Arc::new(FakeGateway::with_error_count(0));
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let ok = args(&["a", "b"])
        .execute(&SyncConfig::default(), discoverer.clone(), gateway.clone(), shutdown)
        .await
        .unwrap();

    assert!(!ok);
    assert_eq!(discoverer.calls(), 0);
    assert!(gateway.calls().is_empty());
}
