//! # ModKit - shared building blocks for service modules
//!
//! - `api`: RFC 9457 problem responses and the offset page envelope used by REST handlers
//! - `http`: an outgoing HTTP client that opens a client span and forwards W3C trace context

pub mod api;
pub mod http;

pub use api::page::{Page, PageRequest};
pub use api::problem::{
    bad_request, bad_gateway, conflict, internal_error, not_found, FieldViolation, Problem,
    ProblemResponse,
};
pub use http::client::TracedClient;
