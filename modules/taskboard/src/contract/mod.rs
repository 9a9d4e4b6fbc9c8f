pub mod client;
pub mod error;
pub mod model;

pub use client::TaskboardApi;
pub use error::TaskboardError;
pub use model::*;
