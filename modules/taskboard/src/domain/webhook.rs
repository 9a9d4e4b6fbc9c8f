use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::contract::model::EventRequest;
use crate::domain::error::{DomainError, WebhookFailure};
use crate::domain::events::WebhookEvent;
use crate::domain::ports::WebhookPort;

pub const DEFAULT_SOURCE: &str = "taskboard-api";
pub const DEFAULT_EVENT_TYPE: &str = "CUSTOM_EVENT";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub timeout: Duration,
    pub default_source: String,
    pub default_type: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            default_source: DEFAULT_SOURCE.to_string(),
            default_type: DEFAULT_EVENT_TYPE.to_string(),
        }
    }
}

/// Builds webhook events and performs a single bounded delivery attempt.
#[derive(Clone)]
pub struct EventDispatcher {
    port: Arc<dyn WebhookPort>,
    config: DispatcherConfig,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl EventDispatcher {
    pub fn new(port: Arc<dyn WebhookPort>, config: DispatcherConfig) -> Self {
        Self { port, config }
    }

    /// Assemble the payload; blank or missing source/type fall back to the configured defaults.
    pub fn build_event(&self, request: EventRequest) -> WebhookEvent {
        WebhookEvent {
            id: Uuid::new_v4(),
            source: non_blank(request.source)
                .unwrap_or_else(|| self.config.default_source.clone()),
            event_type: non_blank(request.event_type)
                .unwrap_or_else(|| self.config.default_type.clone()),
            message: request.message,
            created_at: Utc::now(),
        }
    }

    #[instrument(
        name = "taskboard.service.events.send",
        skip(self, request),
        fields(event_id = tracing::field::Empty)
    )]
    pub async fn send(&self, request: EventRequest) -> Result<(), DomainError> {
        let event = self.build_event(request);
        tracing::Span::current().record("event_id", tracing::field::display(event.id));

        let outcome = match tokio::time::timeout(self.config.timeout, self.port.deliver(&event))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(WebhookFailure::Timeout {
                after: self.config.timeout,
            }),
        };

        match outcome {
            Ok(()) => {
                info!(source = %event.source, event_type = %event.event_type, "Webhook event sent");
                Ok(())
            }
            Err(cause) => {
                error!(error = %cause, "Error sending webhook event");
                Err(DomainError::webhook_delivery_failed(cause))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPort {
        seen: Mutex<Vec<WebhookEvent>>,
        fail_with: Option<WebhookFailure>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl WebhookPort for RecordingPort {
        async fn deliver(&self, event: &WebhookEvent) -> Result<(), WebhookFailure> {
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            self.seen.lock().unwrap().push(event.clone());
            match &self.fail_with {
                Some(f) => Err(f.clone()),
                None => Ok(()),
            }
        }
    }

    fn request(source: Option<&str>, event_type: Option<&str>) -> EventRequest {
        EventRequest {
            message: "hello".into(),
            source: source.map(str::to_string),
            event_type: event_type.map(str::to_string),
        }
    }

    #[test]
    fn defaults_fill_blank_and_missing_fields() {
        let d = EventDispatcher::new(Arc::new(RecordingPort::default()), DispatcherConfig::default());

        let e = d.build_event(request(None, Some("   ")));
        assert_eq!(e.source, DEFAULT_SOURCE);
        assert_eq!(e.event_type, DEFAULT_EVENT_TYPE);
        assert_eq!(e.message, "hello");

        let e = d.build_event(request(Some("billing"), Some("INVOICE_PAID")));
        assert_eq!(e.source, "billing");
        assert_eq!(e.event_type, "INVOICE_PAID");
    }

    #[test]
    fn every_event_gets_a_fresh_id() {
        let d = EventDispatcher::new(Arc::new(RecordingPort::default()), DispatcherConfig::default());
        let a = d.build_event(request(None, None));
        let b = d.build_event(request(None, None));
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn delivers_exactly_once() {
        let port = Arc::new(RecordingPort::default());
        let d = EventDispatcher::new(port.clone(), DispatcherConfig::default());
        d.send(request(None, None)).await.unwrap();
        assert_eq!(port.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejection_is_wrapped() {
        let port = Arc::new(RecordingPort {
            fail_with: Some(WebhookFailure::Rejected { status: 503 }),
            ..Default::default()
        });
        let d = EventDispatcher::new(port.clone(), DispatcherConfig::default());
        let err = d.send(request(None, None)).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::WebhookDeliveryFailed {
                cause: WebhookFailure::Rejected { status: 503 }
            }
        ));
        assert_eq!(port.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_port_times_out() {
        let port = Arc::new(RecordingPort {
            delay: Some(Duration::from_secs(30)),
            ..Default::default()
        });
        let d = EventDispatcher::new(port.clone(), DispatcherConfig::default());
        let err = d.send(request(None, None)).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::WebhookDeliveryFailed {
                cause: WebhookFailure::Timeout { after }
            } if after == DEFAULT_TIMEOUT
        ));
        assert!(port.seen.lock().unwrap().is_empty());
    }
}
