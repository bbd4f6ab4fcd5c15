// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::connection::{SendError, TransportError};
use crate::queue::QueueError;

/// All possible errors that can occur in the pulse client library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown channel: '{0}'\n  hint: valid channels are: {valid}", valid = crate::channels::CHANNEL_NAMES.join(", "))]
    UnknownChannel(String),

    #[error("unknown filter '{key}' for channel '{channel}'\n  hint: valid filters are: {valid}")]
    UnknownFilter {
        channel: String,
        key: String,
        valid: String,
    },

    #[error(transparent)]
    Core(#[from] pulse_core::Error),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for pulse client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
