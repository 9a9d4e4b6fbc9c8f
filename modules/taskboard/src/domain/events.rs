use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Immutable event handed to the webhook port. A fresh id and timestamp are
/// minted for every dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
