// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! pulse-core: Shared types for the pulse realtime client
//!
//! This crate provides the wire protocol envelopes, the connection status
//! model, and the queued-message state machine used by the `pulse` client
//! crate.

pub mod clock;
pub mod error;
pub mod message;
pub mod protocol;
pub mod status;

pub use clock::{ClockSource, SystemClock};
pub use error::{Error, Result};
pub use message::{MessageStatus, QueuedMessage};
pub use protocol::{Inbound, InboundEnvelope, OutboundEnvelope};
pub use status::{ConnectionStatus, StatusChange};
