//! HTTP utilities for modkit
//!
//! This module provides the outgoing HTTP client and the W3C trace context
//! helpers it relies on.

pub mod client;
pub mod trace_context;
