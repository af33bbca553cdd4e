//! Configuration domain types and the central defaults table.

pub mod defaults;
pub mod types;

pub use types::*;
