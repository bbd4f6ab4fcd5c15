// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound messages awaiting delivery confirmation.
//!
//! A [`QueuedMessage`] moves through a small state machine:
//!
//! ```text
//!            begin_send            mark_sent
//! pending ─────────────► sending ────────────► sent (pruned)
//!    ▲                      │
//!    │   record_failure     │  record_failure
//!    └──────────────────────┘  (retry budget spent)
//!                           └────────────────► failed
//!    ▲                                           │
//!    └────────────── reset_for_retry ────────────┘
//! ```
//!
//! Persisted records use camelCase field names and tolerate missing
//! fields so queues written by older producers still load.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::ClockSource;
use crate::error::{Error, Result};

const ID_SUFFIX_LEN: usize = 9;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Delivery status of a queued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Waiting for a processing pass.
    #[default]
    Pending,
    /// Handed to the delivery mechanism, outcome unknown.
    Sending,
    /// Delivered; removed at the end of the next processing pass.
    Sent,
    /// Retry budget exhausted; waits for an explicit retry.
    Failed,
}

impl MessageStatus {
    /// Returns the persisted name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Sending => "sending",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(MessageStatus::Pending),
            "sending" => Ok(MessageStatus::Sending),
            "sent" => Ok(MessageStatus::Sent),
            "failed" => Ok(MessageStatus::Failed),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// A message held in the durable outbound queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMessage {
    /// Unique id, `<unix-millis>-<random>`.
    pub id: String,

    /// Conversation or session the message belongs to.
    #[serde(default, alias = "session_id", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Caller payload.
    #[serde(default)]
    pub message: Value,

    /// Caller-defined context sent alongside the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Creation time.
    #[serde(default = "Utc::now", with = "timestamp_compat")]
    pub timestamp: DateTime<Utc>,

    /// Failed delivery attempts since creation or the last retry.
    #[serde(default, alias = "retry_count")]
    pub retry_count: u32,

    /// Delivery status.
    #[serde(default)]
    pub status: MessageStatus,

    /// Last delivery error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueuedMessage {
    /// Creates a pending message.
    pub fn new(
        id: String,
        message: Value,
        session_id: Option<String>,
        context: Option<Value>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        QueuedMessage {
            id,
            session_id,
            message,
            context,
            timestamp,
            retry_count: 0,
            status: MessageStatus::Pending,
            error: None,
        }
    }

    /// Creates a pending message with a fresh id and the clock's time.
    pub fn create<C: ClockSource + ?Sized>(
        clock: &C,
        message: Value,
        session_id: Option<String>,
        context: Option<Value>,
    ) -> Self {
        let id = generate_id(clock.now_ms(), &mut rand::thread_rng());
        QueuedMessage::new(id, message, session_id, context, clock.now_utc())
    }

    /// Returns true if a processing pass should attempt delivery.
    pub fn is_deliverable(&self, max_retry_count: u32) -> bool {
        self.status == MessageStatus::Pending && self.retry_count < max_retry_count
    }

    /// Marks the message as handed to the delivery mechanism.
    pub fn begin_send(&mut self) {
        self.status = MessageStatus::Sending;
    }

    /// Marks the message as delivered.
    pub fn mark_sent(&mut self) {
        self.status = MessageStatus::Sent;
        self.error = None;
    }

    /// Records a failed delivery attempt.
    ///
    /// Returns true if the retry budget is now spent and the message is
    /// `failed`; otherwise the message is `pending` again.
    pub fn record_failure(&mut self, error: impl Into<String>, max_retry_count: u32) -> bool {
        self.retry_count = self.retry_count.saturating_add(1).min(max_retry_count);
        self.error = Some(error.into());
        if self.retry_count >= max_retry_count {
            self.status = MessageStatus::Failed;
            true
        } else {
            self.status = MessageStatus::Pending;
            false
        }
    }

    /// Resets a failed message for another round of attempts.
    pub fn reset_for_retry(&mut self) {
        self.status = MessageStatus::Pending;
        self.retry_count = 0;
        self.error = None;
    }

    /// Resets a message interrupted mid-send.
    ///
    /// Returns true if the message was `sending`.
    pub fn recover_interrupted(&mut self) -> bool {
        if self.status == MessageStatus::Sending {
            self.status = MessageStatus::Pending;
            true
        } else {
            false
        }
    }
}

/// Generates a message id from a millisecond timestamp and random suffix.
pub fn generate_id<R: Rng + ?Sized>(now_ms: u64, rng: &mut R) -> String {
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{now_ms}-{suffix}")
}

/// Accepts RFC 3339 strings or epoch milliseconds; writes RFC 3339.
mod timestamp_compat {
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Millis(ms) => DateTime::from_timestamp_millis(ms)
                .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {ms}"))),
            Raw::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
