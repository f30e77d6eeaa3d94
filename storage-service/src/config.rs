// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use storage_monitor::ShaperConfig;
use thiserror::Error;

pub const CONFIG_ENV: &str = "STORAGE_MONITOR_CONFIG";
const CONFIG_DIR: &str = "storage-monitor";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub log_level: LoggingLevel,
    /// Also write logs to this file
    pub log_file: Option<PathBuf>,
    pub rate_limit_ms: u64,
    pub changes_done_delay_ms: u64,
    /// Period of the mount table re-check
    pub poll_interval_secs: u64,
    /// Mount prefixes treated as system-internal on top of the built-in list
    pub system_internal_paths: Vec<PathBuf>,
    /// Paths whose file changes are shaped and logged
    pub watch_paths: Vec<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let shaper = ShaperConfig::default();
        Self {
            log_level: LoggingLevel::Info,
            log_file: None,
            rate_limit_ms: shaper.rate_limit.as_millis() as u64,
            changes_done_delay_ms: shaper.changes_done_delay.as_millis() as u64,
            poll_interval_secs: 5,
            system_internal_paths: Vec::new(),
            watch_paths: Vec::new(),
        }
    }
}

impl MonitorConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields defaults. An unreadable or malformed one is an
    /// error, reported by the caller once logging is up.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::read(&path)
    }

    pub fn shaper(&self) -> ShaperConfig {
        ShaperConfig {
            rate_limit: Duration::from_millis(self.rate_limit_ms),
            changes_done_delay: Duration::from_millis(self.changes_done_delay_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    resolve_config_path(
        std::env::var_os(CONFIG_ENV),
        std::env::var_os("XDG_CONFIG_HOME"),
        std::env::var_os("HOME"),
    )
}

fn resolve_config_path(
    explicit: Option<OsString>,
    xdg_config: Option<OsString>,
    home: Option<OsString>,
) -> Option<PathBuf> {
    if let Some(file) = explicit.filter(|f| !f.is_empty()) {
        return Some(PathBuf::from(file));
    }

    if let Some(xdg_config) = xdg_config.filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(xdg_config).join(CONFIG_DIR).join(CONFIG_FILE));
    }

    home.filter(|h| !h.is_empty()).map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    })
}
