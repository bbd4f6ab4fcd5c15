// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket frame envelopes for client-server communication.
//!
//! Every frame is a JSON object with a `type` discriminator:
//! - Client sends `ping` heartbeats and caller-defined actions
//! - Server sends `pong`, `error`, and channel-specific domain events
//!
//! Only `pong` and rate-limit `error` frames are interpreted by the
//! transport layer; everything else is dispatched by `type` to listeners.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Well-known frame types.
pub mod kinds {
    pub const PING: &str = "ping";
    pub const PONG: &str = "pong";
    pub const ERROR: &str = "error";

    pub const LOG_ENTRY: &str = "log_entry";

    pub const TASK_STATUS: &str = "task_status";
    pub const TASK_PROGRESS: &str = "task_progress";
    pub const TASK_COMPLETE: &str = "task_complete";
    pub const NOTIFICATION: &str = "notification";

    pub const WORKFLOW_STATUS: &str = "workflow_status";
    pub const WORKFLOW_PROGRESS: &str = "workflow_progress";
    pub const WORKFLOW_COMPLETE: &str = "workflow_complete";
    pub const WORKFLOW_FAILED: &str = "workflow_failed";

    pub const INTEGRATION_EVENT: &str = "integration_event";
    pub const WEBHOOK_DELIVERY: &str = "webhook_delivery";
    pub const QUEUE_UPDATE: &str = "queue_update";

    pub const BACKEND_HEALTH: &str = "backend_health";
    pub const BACKEND_METRICS: &str = "backend_metrics";
    pub const LOAD_DISTRIBUTION: &str = "load_distribution";
    pub const HEALTH_CHECK: &str = "health_check";

    pub const KNOWLEDGE_PROGRESS: &str = "knowledge_progress";
    pub const PHASE_COMPLETE: &str = "phase_complete";
    pub const ITEM_PROCESSED: &str = "item_processed";

    pub const ITEM_CREATED: &str = "item_created";
    pub const ITEM_UPDATED: &str = "item_updated";
    pub const ITEM_DELETED: &str = "item_deleted";
    pub const ITEM_REPROCESSED: &str = "item_reprocessed";

    pub const SEARCH_RESULTS: &str = "search_results";
    pub const SEARCH_SUGGESTIONS: &str = "search_suggestions";
}

/// A frame received from the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboundEnvelope {
    /// Dispatch key.
    #[serde(rename = "type")]
    pub kind: String,

    /// Event payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Server time, carried by `pong` frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Human-readable text, carried by `error` frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Seconds the client should back off, carried by rate-limit errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<f64>,
}

/// How the transport layer treats an inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Heartbeat acknowledgement.
    Pong {
        /// Server timestamp, if provided.
        timestamp: Option<String>,
    },

    /// Server-side rate limit signal.
    RateLimited {
        /// Server-provided description.
        message: Option<String>,
        /// Seconds until the server accepts messages again.
        retry_after: f64,
    },

    /// Domain event to dispatch to listeners registered for `kind`.
    Event {
        /// Frame type.
        kind: String,
        /// Payload, `Value::Null` when the frame carried none.
        data: Value,
    },
}

impl InboundEnvelope {
    /// Creates a domain event frame.
    pub fn event(kind: impl Into<String>, data: Value) -> Self {
        InboundEnvelope {
            kind: kind.into(),
            data: Some(data),
            timestamp: None,
            message: None,
            retry_after: None,
        }
    }

    /// Creates a Pong frame.
    pub fn pong(timestamp: impl Into<String>) -> Self {
        InboundEnvelope {
            kind: kinds::PONG.to_string(),
            data: None,
            timestamp: Some(timestamp.into()),
            message: None,
            retry_after: None,
        }
    }

    /// Creates an Error frame, optionally carrying a rate-limit hint.
    pub fn error(message: impl Into<String>, retry_after: Option<f64>) -> Self {
        InboundEnvelope {
            kind: kinds::ERROR.to_string(),
            data: None,
            timestamp: None,
            message: Some(message.into()),
            retry_after,
        }
    }

    /// Classifies the frame for dispatch.
    ///
    /// An `error` frame without `retry_after` is an ordinary event and is
    /// dispatched to `error` listeners.
    pub fn classify(self) -> Inbound {
        if self.kind == kinds::PONG {
            return Inbound::Pong {
                timestamp: self.timestamp,
            };
        }
        match self.retry_after {
            Some(retry_after) if self.kind == kinds::ERROR => Inbound::RateLimited {
                message: self.message,
                retry_after,
            },
            _ => Inbound::Event {
                kind: self.kind,
                data: self.data.unwrap_or(Value::Null),
            },
        }
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a frame from JSON.
    ///
    /// Fails on invalid JSON, a missing or non-string `type`, or an empty
    /// `type`.
    pub fn from_json(s: &str) -> Result<Self> {
        let envelope: InboundEnvelope = serde_json::from_str(s)?;
        if envelope.kind.trim().is_empty() {
            return Err(Error::MalformedFrame("empty frame type".to_string()));
        }
        Ok(envelope)
    }
}

/// A frame sent to the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutboundEnvelope {
    /// Frame type.
    #[serde(rename = "type")]
    pub kind: String,

    /// Frame payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl OutboundEnvelope {
    /// Creates a frame with the given type and payload.
    pub fn new(kind: impl Into<String>, data: Option<Value>) -> Self {
        OutboundEnvelope {
            kind: kind.into(),
            data,
        }
    }

    /// Creates a heartbeat Ping frame.
    pub fn ping() -> Self {
        OutboundEnvelope::new(kinds::PING, None)
    }

    /// Returns true for heartbeat traffic, which bypasses rate limiting.
    pub fn is_heartbeat(&self) -> bool {
        self.kind == kinds::PING
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a frame from JSON.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
