use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::domain::error::WebhookFailure;
use crate::domain::events::WebhookEvent;
use crate::domain::ports::WebhookPort;
use modkit::TracedClient;

/// JSON body posted to the webhook destination.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload<'a> {
    pub id: Uuid,
    pub source: &'a str,
    #[serde(rename = "type")]
    pub event_type: &'a str,
    pub message: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a WebhookEvent> for WebhookPayload<'a> {
    fn from(e: &'a WebhookEvent) -> Self {
        Self {
            id: e.id,
            source: &e.source,
            event_type: &e.event_type,
            message: &e.message,
            created_at: e.created_at,
        }
    }
}

/// HTTP adapter implementing the WebhookPort with a single POST per event.
pub struct HttpWebhookClient {
    client: TracedClient,
    destination: Url,
    timeout: Duration,
}

impl HttpWebhookClient {
    pub fn new(client: TracedClient, destination: Url, timeout: Duration) -> Self {
        Self {
            client,
            destination,
            timeout,
        }
    }

    /// Adapter whose requests are bounded by `timeout` at the HTTP client level.
    pub fn with_timeout(destination: Url, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self::new(
            TracedClient::with_timeout(timeout)?,
            destination,
            timeout,
        ))
    }

    fn transport_failure(&self, err: reqwest::Error) -> WebhookFailure {
        if err.is_timeout() {
            WebhookFailure::Timeout {
                after: self.timeout,
            }
        } else if err.is_builder() {
            WebhookFailure::InvalidDestination {
                message: err.to_string(),
            }
        } else {
            WebhookFailure::Transport {
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl WebhookPort for HttpWebhookClient {
    #[instrument(
        name = "taskboard.http.webhook.deliver",
        skip_all,
        fields(destination = %self.destination, event_id = %event.id)
    )]
    async fn deliver(&self, event: &WebhookEvent) -> Result<(), WebhookFailure> {
        let payload = WebhookPayload::from(event);
        let response = self
            .client
            .post_json(self.destination.as_str(), &payload)
            .await
            .map_err(|e| self.transport_failure(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookFailure::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
