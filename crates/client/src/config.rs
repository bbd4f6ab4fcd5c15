// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration management.
//!
//! Configuration is read from `pulse.toml` (or the file named by
//! `PULSE_CONFIG`) and then overridden by `PULSE_*` environment variables.
//! Every field has a default, so an empty or missing file is valid:
//!
//! ```toml
//! [connection]
//! base_url = "wss://agents.example.com/ws"
//! heartbeat_interval_ms = 30000
//!
//! [queue]
//! max_retry_count = 3
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};

const CONFIG_FILE_NAME: &str = "pulse.toml";
const STATE_DIR_NAME: &str = "pulse";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Realtime connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Durable outbound queue settings.
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Settings for the realtime connection manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base address; endpoints are appended as path segments.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Automatic reconnect attempts before giving up (default: 5).
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Base reconnect delay, multiplied by the attempt number (default: 1000).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Ping interval in milliseconds (default: 30000).
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Max time without a pong before the connection is torn down (default: 90000).
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// Send ceiling per rate window, including the heartbeat reserve (default: 100).
    #[serde(default = "default_max_messages_per_minute")]
    pub max_messages_per_minute: u32,
    /// Length of the rolling rate window in milliseconds (default: 60000).
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,
    /// Part of the ceiling held back for heartbeat traffic (default: 10).
    #[serde(default = "default_rate_limit_reserve")]
    pub rate_limit_reserve: u32,
}

/// Settings for the durable outbound queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Delivery attempts before a message is marked failed (default: 3).
    #[serde(default = "default_max_retry_count")]
    pub max_retry_count: u32,
    /// Base delay after a failed attempt, multiplied by the retry count (default: 1000).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Directory holding the persisted queue. Defaults to the user state dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    "ws://localhost:8000/ws".to_string()
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay_ms() -> u64 {
    1_000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_connection_timeout_ms() -> u64 {
    90_000
}

fn default_max_messages_per_minute() -> u32 {
    100
}

fn default_rate_limit_window_ms() -> u64 {
    60_000
}

fn default_rate_limit_reserve() -> u32 {
    10
}

fn default_max_retry_count() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            base_url: default_base_url(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            connection_timeout_ms: default_connection_timeout_ms(),
            max_messages_per_minute: default_max_messages_per_minute(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            rate_limit_reserve: default_rate_limit_reserve(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            max_retry_count: default_max_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            state_dir: None,
        }
    }
}

impl ConnectionConfig {
    /// Delay before reconnect attempt `attempt` (1-based): linear in the attempt number.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms.saturating_mul(u64::from(attempt)))
    }

    /// Interval between heartbeat pings.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Max silence after the last pong before teardown.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// Length of the rolling rate window.
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    /// Non-heartbeat sends allowed per window.
    pub fn send_ceiling(&self) -> u32 {
        self.max_messages_per_minute.saturating_sub(self.rate_limit_reserve)
    }

    /// Checks that the settings describe a usable connection.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("ws://") || self.base_url.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "base_url must start with ws:// or wss://, got '{}'",
                self.base_url
            )));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(Error::Config("heartbeat_interval_ms must be greater than 0".to_string()));
        }
        if self.connection_timeout_ms == 0 {
            return Err(Error::Config("connection_timeout_ms must be greater than 0".to_string()));
        }
        if self.rate_limit_window_ms == 0 {
            return Err(Error::Config("rate_limit_window_ms must be greater than 0".to_string()));
        }
        Ok(())
    }
}

impl QueueConfig {
    /// Delay after the `retry_count`-th failed attempt.
    pub fn retry_delay(&self, retry_count: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(u64::from(retry_count)))
    }

    /// Resolves the directory that holds the persisted queue.
    pub fn resolved_state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(default_state_dir)
    }
}

impl Config {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }

    /// Loads configuration from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(Error::Config(format!("failed to read config: {}", e))),
        };
        Self::from_toml_str(&content)
    }

    /// Loads `PULSE_CONFIG` (or `./pulse.toml`), applies environment
    /// overrides, and validates the result.
    pub fn resolve() -> Result<Self> {
        Self::resolve_with(None)
    }

    /// Like [`Config::resolve`], reading `path` when given.
    pub fn resolve_with(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(env::config_path)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        let mut config = Self::load(&path)?;
        config.apply_env();
        config.connection.validate()?;
        Ok(config)
    }

    /// Overrides fields with any `PULSE_*` environment variables that are set.
    pub fn apply_env(&mut self) {
        let conn = &mut self.connection;
        if let Some(url) = env::base_url() {
            conn.base_url = url;
        }
        if let Some(v) = env::max_reconnect_attempts() {
            conn.max_reconnect_attempts = v;
        }
        if let Some(v) = env::reconnect_delay_ms() {
            conn.reconnect_delay_ms = v;
        }
        if let Some(v) = env::heartbeat_interval_ms() {
            conn.heartbeat_interval_ms = v;
        }
        if let Some(v) = env::connection_timeout_ms() {
            conn.connection_timeout_ms = v;
        }
        if let Some(v) = env::max_messages_per_minute() {
            conn.max_messages_per_minute = v;
        }
        if let Some(v) = env::rate_limit_window_ms() {
            conn.rate_limit_window_ms = v;
        }
        if let Some(dir) = env::state_dir() {
            self.queue.state_dir = Some(dir);
        }
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))
    }
}

/// Returns the default state directory: `$XDG_STATE_HOME/pulse`, falling
/// back to the platform state or data directory.
pub fn default_state_dir() -> PathBuf {
    env::xdg_state_home()
        .or_else(dirs::state_dir)
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(STATE_DIR_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
