pub mod http_webhook_client;

pub use http_webhook_client::{HttpWebhookClient, WebhookPayload};
