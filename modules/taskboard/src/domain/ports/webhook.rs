use async_trait::async_trait;

use crate::domain::error::WebhookFailure;
use crate::domain::events::WebhookEvent;

/// Transport-agnostic outbound notification port.
#[async_trait]
pub trait WebhookPort: Send + Sync {
    /// Deliver `event` once. The response body, if any, is discarded.
    async fn deliver(&self, event: &WebhookEvent) -> Result<(), WebhookFailure>;
}
