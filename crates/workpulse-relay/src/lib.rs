//! Push channel for workpulsed
//!
//! Provides:
//! - WebSocket server on its own TCP listener
//! - Subscriber registry with per-subscriber failure isolation
//! - JSON envelope fan-out
//! - Ping/pong keepalive

mod broadcaster;
mod server;
mod subscriber;

pub use broadcaster::*;
pub use server::*;
pub use subscriber::*;

use thiserror::Error;

/// Relay errors
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

pub type RelayResult<T> = Result<T, RelayError>;
