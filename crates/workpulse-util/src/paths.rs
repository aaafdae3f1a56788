//! Default paths for workpulse components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/workpulse/config.toml` or `~/.config/workpulse/config.toml`
//! - Data: `$XDG_DATA_HOME/workpulse` or `~/.local/share/workpulse`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const WORKPULSE_DATA_DIR_ENV: &str = "WORKPULSE_DATA_DIR";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Default ledger filename within the data directory
pub const DEFAULT_LEDGER_FILENAME: &str = "work_stats.json";

/// Application subdirectory name
const APP_DIR: &str = "workpulse";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/workpulse/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/workpulse/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/tmp").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$WORKPULSE_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/workpulse` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/workpulse` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(WORKPULSE_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    xdg_data_dir()
}

fn xdg_data_dir() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join("data")
}
