//! Outgoing webhook delivery against a local mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use httpmock::prelude::*;
use modkit::TracedClient;
use serde_json::json;
use url::Url;
use uuid::Uuid;

use taskboard::contract::model::EventRequest;
use taskboard::domain::error::{DomainError, WebhookFailure};
use taskboard::domain::events::WebhookEvent;
use taskboard::domain::ports::WebhookPort;
use taskboard::domain::webhook::{DispatcherConfig, EventDispatcher};
use taskboard::infra::webhook::HttpWebhookClient;

fn event() -> WebhookEvent {
    WebhookEvent {
        id: Uuid::new_v4(),
        source: "billing".into(),
        event_type: "INVOICE_PAID".into(),
        message: "invoice 7 paid".into(),
        created_at: Utc::now(),
    }
}

fn hook_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/webhook", server.base_url())).unwrap()
}

#[tokio::test]
async fn delivery_posts_json_payload_with_traceparent() {
    let server = MockServer::start_async().await;
    let ev = event();

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/webhook")
                .header("content-type", "application/json")
                .header_exists("traceparent")
                .json_body(json!({
                    "id": ev.id,
                    "source": "billing",
                    "type": "INVOICE_PAID",
                    "message": "invoice 7 paid",
                    "createdAt": ev.created_at,
                }));
            then.status(204);
        })
        .await;

    let adapter = HttpWebhookClient::new(
        TracedClient::default(),
        hook_url(&server),
        Duration::from_secs(5),
    );
    let result = adapter.deliver(&ev).await;

    mock.assert_async().await;
    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn non_success_status_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/webhook");
            then.status(500);
        })
        .await;

    let adapter = HttpWebhookClient::new(
        TracedClient::default(),
        hook_url(&server),
        Duration::from_secs(5),
    );
    let err = adapter.deliver(&event()).await.unwrap_err();
    assert_eq!(err, WebhookFailure::Rejected { status: 500 });
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/webhook");
            then.status(200).delay(Duration::from_millis(1500));
        })
        .await;

    let timeout = Duration::from_millis(100);
    let adapter = HttpWebhookClient::with_timeout(hook_url(&server), timeout).unwrap();
    let err = adapter.deliver(&event()).await.unwrap_err();
    assert_eq!(err, WebhookFailure::Timeout { after: timeout });
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
    // Nothing listens on port 1.
    let adapter = HttpWebhookClient::new(
        TracedClient::default(),
        Url::parse("http://127.0.0.1:1/webhook").unwrap(),
        Duration::from_secs(5),
    );
    let err = adapter.deliver(&event()).await.unwrap_err();
    assert!(matches!(err, WebhookFailure::Transport { .. }), "{err:?}");
}

#[tokio::test]
async fn dispatcher_reports_upstream_rejection() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/webhook")
                .header_exists("traceparent");
            then.status(503);
        })
        .await;

    let port: Arc<dyn WebhookPort> = Arc::new(
        HttpWebhookClient::with_timeout(hook_url(&server), Duration::from_secs(2)).unwrap(),
    );
    let dispatcher = EventDispatcher::new(port, DispatcherConfig::default());

    let err = dispatcher
        .send(EventRequest {
            message: "ping".into(),
            source: None,
            event_type: None,
        })
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(
        err,
        DomainError::WebhookDeliveryFailed {
            cause: WebhookFailure::Rejected { status: 503 }
        }
    ));
}
