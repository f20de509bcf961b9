//! Error types for drawing import.

pub mod conversions;
pub mod types;

pub use types::{Error, Result};
