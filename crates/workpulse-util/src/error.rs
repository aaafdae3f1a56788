//! Error types shared across workpulse crates

use thiserror::Error;

/// Failure to parse an `MM:SS` elapsed-time string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElapsedParseError {
    #[error("Expected MM:SS, got '{0}'")]
    InvalidFormat(String),

    #[error("Invalid minutes in '{0}'")]
    InvalidMinutes(String),

    #[error("Invalid seconds in '{0}'")]
    InvalidSeconds(String),

    #[error("Seconds must be below 60 in '{0}'")]
    SecondsOutOfRange(String),
}
