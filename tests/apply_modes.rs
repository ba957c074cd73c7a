//! One-shot apply against an in-memory Connect gateway.

mod common;

use common::{topics, Call, FakeGateway};
use kafka_connect_sink::{
    ApplyMode, ApplyOutcome, ConnectorError, ReconciliationController, S3SinkSettings,
    S3_SINK_CONNECTOR_CLASS,
};
use std::sync::Arc;

fn base() -> kafka_connect_sink::ConnectorConfig {
    S3SinkSettings {
        s3_bucket_name: "archive".to_string(),
        ..Default::default()
    }
    .build()
}

#[tokio::test]
async fn test_commit_validates_then_upserts() {
    let gateway = Arc::new(FakeGateway::with_error_count(0));
    let controller = ReconciliationController::new(gateway.clone());

    let outcome = controller
        .apply("s3-sink", &base(), &topics(&["b", "a"]), ApplyMode::Commit)
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.committed_topics(), Some(&topics(&["a", "b"])));

    let calls = gateway.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(&calls[0], Call::Validate { class, .. } if class == S3_SINK_CONNECTOR_CLASS));
    assert!(matches!(&calls[1], Call::Upsert { name, .. } if name == "s3-sink"));
    assert_eq!(gateway.upserted_topics(0), "a,b");
}

#[tokio::test]
async fn test_commit_rejected_never_upserts() {
    let gateway = Arc::new(FakeGateway::with_error_count(2));
    let controller = ReconciliationController::new(gateway.clone());

    let outcome = controller
        .apply("s3-sink", &base(), &topics(&["a"]), ApplyMode::Commit)
        .await
        .unwrap();

    match &outcome {
        ApplyOutcome::Rejected { result } => assert_eq!(result.error_count, 2),
        other => panic!("expected rejection, got {:?}", other),
    }
    assert!(!outcome.is_success());
    assert!(gateway.upserts().is_empty());
}

#[tokio::test]
async fn test_commit_unparseable_validation_fails_closed() {
    let gateway = Arc::new(FakeGateway::with_validation_body("<html>502 Bad Gateway</html>"));
    let controller = ReconciliationController::new(gateway.clone());

    let err = controller
        .apply("s3-sink", &base(), &topics(&["a"]), ApplyMode::Commit)
        .await
        .unwrap_err();

    match err {
        ConnectorError::InvalidValidationResponse { raw } => {
            assert_eq!(raw, "<html>502 Bad Gateway</html>")
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(gateway.upserts().is_empty());
}

#[tokio::test]
async fn test_empty_topics_make_no_remote_calls() {
    let gateway = Arc::new(FakeGateway::with_error_count(0));
    let controller = ReconciliationController::new(gateway.clone());

    for mode in [ApplyMode::Validate, ApplyMode::DryRun, ApplyMode::Commit] {
        let outcome = controller
            .apply("s3-sink", &base(), &topics(&[]), mode)
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::NoTopics);
    }
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_dry_run_never_contacts_gateway() {
    let gateway = Arc::new(FakeGateway::with_error_count(5));
    let controller = ReconciliationController::new(gateway.clone());

    let outcome = controller
        .apply("s3-sink", &base(), &topics(&["x", "y"]), ApplyMode::DryRun)
        .await
        .unwrap();

    match outcome {
        ApplyOutcome::DryRun { config } => assert_eq!(config.topics(), topics(&["x", "y"])),
        other => panic!("expected dry run, got {:?}", other),
    }
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_validate_returns_raw_body_without_upsert() {
    let body = r#"{"error_count":1,"configs":[]}"#;
    let gateway = Arc::new(FakeGateway::with_validation_body(body));
    let controller = ReconciliationController::new(gateway.clone());

    let outcome = controller
        .apply("s3-sink", &base(), &topics(&["a"]), ApplyMode::Validate)
        .await
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Validated { raw: body.to_string() });
    assert_eq!(gateway.calls().len(), 1);
    assert!(gateway.upserts().is_empty());
}

#[tokio::test]
async fn test_repeated_commit_sends_identical_payloads() {
    let gateway = Arc::new(FakeGateway::with_error_count(0));
    let controller = ReconciliationController::new(gateway.clone());
    let set = topics(&["orders", "payments"]);

    for _ in 0..2 {
        controller
            .apply("s3-sink", &base(), &set, ApplyMode::Commit)
            .await
            .unwrap();
    }

    let upserts = gateway.upserts();
    assert_eq!(upserts.len(), 2);
    assert_eq!(upserts[0], upserts[1]);
}

#[tokio::test]
async fn test_upsert_failure_propagates() {
    let gateway = Arc::new(FakeGateway::with_error_count(0));
    gateway.fail_next_upserts(1);
    let controller = ReconciliationController::new(gateway.clone());

    let err = controller
        .apply("s3-sink", &base(), &topics(&["a"]), ApplyMode::Commit)
        .await
        .unwrap_err();

    assert!(err.is_retryable());
}
