//! Validated settings structures

use crate::schema::{RawConfig, RawMarkers, RawServiceConfig};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;
use workpulse_util::{DEFAULT_LEDGER_FILENAME, default_data_dir};

pub const DEFAULT_HTTP_PORT: u16 = 4090;
pub const DEFAULT_PUSH_PORT: u16 = 4091;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Validated settings ready for use by the service
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub service: ServiceConfig,
    pub markers: MarkerConfig,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceConfig::from_raw(raw.service),
            markers: MarkerConfig::from_raw(raw.markers),
        }
    }
}

/// Listener and storage configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Loopback address of the HTTP ingress
    pub http_addr: SocketAddr,
    /// Address of the push channel
    pub push_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub ledger_file: String,
    pub tick_interval: Duration,
    pub shutdown_timeout: Duration,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        let defaults = Self::default();
        Self {
            http_addr: raw.http_addr.unwrap_or(defaults.http_addr),
            push_addr: raw.push_addr.unwrap_or(defaults.push_addr),
            data_dir: raw.data_dir.unwrap_or(defaults.data_dir),
            ledger_file: raw.ledger_file.unwrap_or(defaults.ledger_file),
            tick_interval: raw
                .tick_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            shutdown_timeout: raw
                .shutdown_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
        }
    }

    /// Full path of the ledger file
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(&self.ledger_file)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_HTTP_PORT)),
            push_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_PUSH_PORT)),
            data_dir: default_data_dir(),
            ledger_file: DEFAULT_LEDGER_FILENAME.to_string(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

/// Status markers (substring match)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerConfig {
    pub start: String,
    pub complete: String,
}

impl MarkerConfig {
    fn from_raw(raw: RawMarkers) -> Self {
        Self {
            start: raw.start,
            complete: raw.complete,
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self::from_raw(RawMarkers::default())
    }
}
