//! REST helpers shared by all modules.

pub mod page;
pub mod problem;
