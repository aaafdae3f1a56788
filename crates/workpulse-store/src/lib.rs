//! Persistence layer for workpulsed
//!
//! Provides:
//! - Per-day ledger of completed work sessions (count + total duration)
//! - JSON file backend with whole-file atomic rewrites

mod json;
mod traits;

pub use json::*;
pub use traits::*;

use std::path::PathBuf;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Failed to persist ledger to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
