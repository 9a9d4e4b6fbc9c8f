use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the taskboard module (`modules.taskboard` in the app config)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskboardConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// Outbound webhook destination and delivery bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    #[serde(default = "default_webhook_url")]
    pub url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_source")]
    pub default_source: String,
    #[serde(default = "default_type")]
    pub default_type: String,
}

impl Default for TaskboardConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: default_webhook_url(),
            timeout_ms: default_timeout_ms(),
            default_source: default_source(),
            default_type: default_type(),
        }
    }
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_page_size() -> u64 {
    20
}

fn default_max_page_size() -> u64 {
    100
}

fn default_webhook_url() -> String {
    "http://localhost:9000/webhook".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_source() -> String {
    crate::domain::webhook::DEFAULT_SOURCE.to_string()
}

fn default_type() -> String {
    crate::domain::webhook::DEFAULT_EVENT_TYPE.to_string()
}
