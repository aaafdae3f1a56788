//! Shared utilities for workpulse
//!
//! This crate provides:
//! - ID types (ClientId)
//! - Time utilities (clock abstraction, monotonic time, `MM:SS` elapsed time)
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
