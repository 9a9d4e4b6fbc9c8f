//! Minimal W3C Trace Context propagation.
//!
//! Trace and span ids are generated per outgoing request; they correlate the
//! downstream call with our `outgoing_http` span but are not exported anywhere.

use http::{HeaderMap, HeaderName, HeaderValue};

/// W3C Trace Context header name
pub const TRACEPARENT: &str = "traceparent";

/// Read the `traceparent` header, if present and valid UTF-8.
pub fn extract_trace_parent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TRACEPARENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Build a sampled version-00 `traceparent` value.
pub fn new_trace_parent() -> String {
    let trace_id = rand::random::<u128>();
    let span_id = rand::random::<u64>();
    format!("00-{trace_id:032x}-{span_id:016x}-01")
}

/// Insert a fresh `traceparent` unless the caller already set one.
pub fn inject_trace_parent(headers: &mut HeaderMap) {
    if headers.contains_key(TRACEPARENT) {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(&new_trace_parent()) {
        headers.insert(HeaderName::from_static(TRACEPARENT), value);
    }
}

/// Trace id part of a `traceparent` value.
pub fn parse_trace_id(traceparent: &str) -> Option<&str> {
    let mut parts = traceparent.split('-');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("00"), Some(trace_id), Some(_), Some(_)) if trace_id.len() == 32 => Some(trace_id),
        _ => None,
    }
}
