pub mod webhook;

pub use webhook::WebhookPort;
