pub mod error;
pub mod events;
pub mod filter;
pub mod ports;
pub mod repo;
pub mod service;
pub mod uniqueness;
pub mod webhook;
