//! Traced HTTP client for outgoing calls.
//!
//! Wraps `reqwest::Client`, opens an `outgoing_http` client span per request
//! and injects a `traceparent` header so the remote side can correlate.

use serde::Serialize;
use std::time::Duration;
use tracing::{Instrument, Level};

use crate::http::trace_context;

#[derive(Clone)]
pub struct TracedClient {
    inner: reqwest::Client,
}

impl TracedClient {
    pub fn new(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Client whose every request is bounded by `timeout` end to end.
    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { inner })
    }

    /// Execute a built request inside an `outgoing_http` span.
    pub async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let span = tracing::span!(
            Level::INFO, "outgoing_http",
            http.method = %req.method(),
            http.url = %req.url(),
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
        );

        trace_context::inject_trace_parent(req.headers_mut());

        async {
            let response = self.inner.execute(req).await?;
            let status = response.status();
            tracing::Span::current().record("http.status_code", status.as_u16());
            if status.is_client_error() || status.is_server_error() {
                tracing::warn!(status = status.as_u16(), "outgoing request returned an error status");
            }
            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// POST `body` as JSON.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> reqwest::Result<reqwest::Response> {
        let req = self.inner.post(url).json(body).build()?;
        self.execute(req).await
    }
}

impl Default for TracedClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}
