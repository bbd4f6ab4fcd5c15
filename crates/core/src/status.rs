// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the realtime connection. Exactly one value at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Dialing the server.
    Connecting,
    /// Connection open, heartbeat running.
    Connected,
    /// No open connection.
    Disconnected,
    /// The transport reported an error.
    Error,
}

impl ConnectionStatus {
    /// Returns the wire/display name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status transition as delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// The new status.
    pub status: ConnectionStatus,
    /// Human-readable detail, set for [`ConnectionStatus::Error`].
    pub message: Option<String>,
}

impl StatusChange {
    /// Creates a transition without detail.
    pub fn new(status: ConnectionStatus) -> Self {
        StatusChange {
            status,
            message: None,
        }
    }

    /// Creates an error transition.
    pub fn error(message: impl Into<String>) -> Self {
        StatusChange {
            status: ConnectionStatus::Error,
            message: Some(message.into()),
        }
    }
}

impl fmt::Display for StatusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.status, message),
            None => write!(f, "{}", self.status),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
