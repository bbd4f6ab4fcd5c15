// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables read by the client are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `PULSE_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    std::env::var(vars::PULSE_CONFIG).ok().map(PathBuf::from)
}

/// Returns the value of `PULSE_BASE_URL` if set and non-empty.
pub fn base_url() -> Option<String> {
    non_empty(vars::PULSE_BASE_URL)
}

/// Returns the value of `PULSE_TOKEN` if set and non-empty.
pub fn token() -> Option<String> {
    non_empty(vars::PULSE_TOKEN)
}

/// Returns the value of `PULSE_STATE_DIR` if set.
pub fn state_dir() -> Option<PathBuf> {
    std::env::var(vars::PULSE_STATE_DIR).ok().map(PathBuf::from)
}

/// Returns the value of `XDG_STATE_HOME` if set.
pub fn xdg_state_home() -> Option<PathBuf> {
    std::env::var(vars::XDG_STATE_HOME).ok().map(PathBuf::from)
}

/// Returns `PULSE_MAX_RECONNECT_ATTEMPTS` parsed as a number.
pub fn max_reconnect_attempts() -> Option<u32> {
    parsed(vars::PULSE_MAX_RECONNECT_ATTEMPTS)
}

/// Returns `PULSE_RECONNECT_DELAY_MS` parsed as a number.
pub fn reconnect_delay_ms() -> Option<u64> {
    parsed(vars::PULSE_RECONNECT_DELAY_MS)
}

/// Returns `PULSE_HEARTBEAT_INTERVAL_MS` parsed as a number.
pub fn heartbeat_interval_ms() -> Option<u64> {
    parsed(vars::PULSE_HEARTBEAT_INTERVAL_MS)
}

/// Returns `PULSE_CONNECTION_TIMEOUT_MS` parsed as a number.
pub fn connection_timeout_ms() -> Option<u64> {
    parsed(vars::PULSE_CONNECTION_TIMEOUT_MS)
}

/// Returns `PULSE_MAX_MESSAGES_PER_MINUTE` parsed as a number.
pub fn max_messages_per_minute() -> Option<u32> {
    parsed(vars::PULSE_MAX_MESSAGES_PER_MINUTE)
}

/// Returns `PULSE_RATE_LIMIT_WINDOW_MS` parsed as a number.
pub fn rate_limit_window_ms() -> Option<u64> {
    parsed(vars::PULSE_RATE_LIMIT_WINDOW_MS)
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Unparseable values are ignored so a typo falls back to the configured value.
fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring {}={:?}: not a number", name, raw);
            None
        }
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
