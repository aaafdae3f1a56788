//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default substring that starts a work session
pub const DEFAULT_START_MARKER: &str = "working";

/// Default substring that completes a work session
pub const DEFAULT_COMPLETE_MARKER: &str = "work complete";

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Listener and storage settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Status classification markers
    #[serde(default)]
    pub markers: RawMarkers,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// HTTP ingress address (default: 127.0.0.1:4090)
    pub http_addr: Option<SocketAddr>,

    /// Push channel address (default: 0.0.0.0:4091)
    pub push_addr: Option<SocketAddr>,

    /// Data directory for the ledger
    pub data_dir: Option<PathBuf>,

    /// Ledger filename within the data directory
    pub ledger_file: Option<String>,

    /// Work timer tick period in milliseconds
    pub tick_interval_ms: Option<u64>,

    /// Upper bound on graceful shutdown
    pub shutdown_timeout_seconds: Option<u64>,
}

/// Substrings used to classify incoming status text
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawMarkers {
    #[serde(default = "default_start_marker")]
    pub start: String,

    #[serde(default = "default_complete_marker")]
    pub complete: String,
}

impl Default for RawMarkers {
    fn default() -> Self {
        Self {
            start: default_start_marker(),
            complete: default_complete_marker(),
        }
    }
}

fn default_start_marker() -> String {
    DEFAULT_START_MARKER.to_string()
}

fn default_complete_marker() -> String {
    DEFAULT_COMPLETE_MARKER.to_string()
}
