//! Delivery against live in-process endpoints.

use axum::http::StatusCode;
use gatepass_core::{Classification, CredentialMapping, CredentialPair, DeliveryOutcome, MappingEntry};
use gatepass_net::{spawn_pipeline, Deliver, PipelineOutcome};
use std::sync::Arc;
use std::time::Duration;

mod common;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_delivery_success_on_200() {
    let mut mock = common::start_mock_endpoint(StatusCode::OK, None).await;
    let client = common::client(mock.endpoint(), TIMEOUT, false);

    let outcome = client.deliver(&CredentialPair::new("1", "5678")).await;
    assert_eq!(outcome, DeliveryOutcome::Success { status: 200 });

    let req = mock.received.recv().await.expect("endpoint saw the request");
    assert_eq!(req.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        req.json(),
        serde_json::json!({"person_id": "1", "person_code": "5678"})
    );
}

#[tokio::test]
async fn test_delivery_failure_on_refused_connection() {
    let endpoint = common::refusing_endpoint().await;
    let client = common::client(endpoint, TIMEOUT, false);

    let outcome = client.deliver(&CredentialPair::new("2", "9101")).await;
    match outcome {
        DeliveryOutcome::Failure { reason } => {
            assert!(reason.starts_with("transport error"), "unexpected reason: {reason}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_2xx_counts_as_sent_by_default() {
    let mut mock = common::start_mock_endpoint(StatusCode::INTERNAL_SERVER_ERROR, None).await;
    let client = common::client(mock.endpoint(), TIMEOUT, false);

    let outcome = client.deliver(&CredentialPair::new("0", "1234")).await;
    assert_eq!(outcome, DeliveryOutcome::Success { status: 500 });
    assert!(mock.received.recv().await.is_some());
}

#[tokio::test]
async fn test_strict_status_rejects_non_2xx() {
    let mock = common::start_mock_endpoint(StatusCode::INTERNAL_SERVER_ERROR, None).await;
    let client = common::client(mock.endpoint(), TIMEOUT, true);

    let outcome = client.deliver(&CredentialPair::new("0", "1234")).await;
    assert_eq!(outcome, DeliveryOutcome::failure("endpoint returned status 500"));
}

#[tokio::test]
async fn test_strict_status_accepts_2xx() {
    let mock = common::start_mock_endpoint(StatusCode::NO_CONTENT, None).await;
    let client = common::client(mock.endpoint(), TIMEOUT, true);

    let outcome = client.deliver(&CredentialPair::new("4", "1234")).await;
    assert_eq!(outcome, DeliveryOutcome::Success { status: 204 });
}

#[tokio::test]
async fn test_timeout_is_a_failure() {
    let mock = common::start_mock_endpoint(StatusCode::OK, Some(Duration::from_secs(3))).await;
    let client = common::client(mock.endpoint(), Duration::from_millis(200), false);

    let outcome = client.deliver(&CredentialPair::new("3", "5678")).await;
    assert!(!outcome.is_success(), "expected timeout failure, got {outcome:?}");
}

#[tokio::test]
async fn test_deliver_to_overrides_configured_endpoint() {
    let mut mock = common::start_mock_endpoint(StatusCode::OK, None).await;
    let unused = common::refusing_endpoint().await;
    let client = common::client(unused, TIMEOUT, false);

    let outcome = client
        .deliver_to(&CredentialPair::new("1", "5678"), &mock.endpoint())
        .await;
    assert!(outcome.is_success());
    assert!(mock.received.recv().await.is_some());
}

#[tokio::test]
async fn test_pipeline_sends_only_resolved_labels() {
    let mut mock = common::start_mock_endpoint(StatusCode::OK, None).await;
    let client = Arc::new(common::client(mock.endpoint(), TIMEOUT, false));
    let mapping = CredentialMapping::from_entries([MappingEntry {
        label: "3 Antonella_sgobba".into(),
        person_id: "3".into(),
        person_code: "5678".into(),
    }])
    .unwrap();
    let handle = spawn_pipeline(Arc::new(mapping), client);

    let miss = handle
        .submit(Ok(Classification::new("unknown_person")))
        .await
        .unwrap();
    assert_eq!(miss, PipelineOutcome::Unresolved("unknown_person".into()));

    let hit = handle
        .submit(Ok(Classification::with_confidence("3 Antonella_sgobba", 0.93)))
        .await
        .unwrap();
    assert_eq!(hit, PipelineOutcome::Delivered(DeliveryOutcome::Success { status: 200 }));

    // Only the resolved event reached the wire.
    let req = mock.received.recv().await.unwrap();
    assert_eq!(req.json(), serde_json::json!({"person_id": "3", "person_code": "5678"}));
    assert!(mock.received.try_recv().is_err());
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let mut mock = common::start_redirecting_endpoint().await;
    let client = common::client(mock.endpoint(), TIMEOUT, false);

    let outcome = client.deliver(&CredentialPair::new("2", "9101")).await;
    assert_eq!(outcome, DeliveryOutcome::Success { status: 307 });

    // Exactly one POST, and only to the configured path.
    let req = mock.received.recv().await.unwrap();
    assert_eq!(req.path, "/update_color");
    assert_eq!(req.json(), serde_json::json!({"person_id": "2", "person_code": "9101"}));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(mock.received.try_recv().is_err(), "credentials were re-posted");
}

#[tokio::test]
async fn test_strict_status_rejects_redirect() {
    let mut mock = common::start_redirecting_endpoint().await;
    let client = common::client(mock.endpoint(), TIMEOUT, true);

    let outcome = client.deliver(&CredentialPair::new("2", "9101")).await;
    assert_eq!(outcome, DeliveryOutcome::failure("endpoint returned status 307"));
    assert_eq!(mock.received.recv().await.unwrap().path, "/update_color");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(mock.received.try_recv().is_err());
}
