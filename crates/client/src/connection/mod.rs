// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime connection module.
//!
//! Keeps one push channel to the server alive and multiplexes every
//! logical subscription over it.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐ spawn ┌─────────────┐     ┌─────────────┐
//! │ ConnectionManager │──────►│   Session   │────►│  Transport  │──► server
//! │     (handle)      │◄──────│ (task loop) │◄────│   (trait)   │◄──
//! └───────────────────┘ state └─────────────┘     └─────────────┘
//!          │                         │
//!          ▼                         ▼
//! ┌───────────────────┐     ┌─────────────────┐
//! │    RateLimiter    │     │ HandlerRegistry │  (type → listeners)
//! └───────────────────┘     └─────────────────┘
//! ```
//!
//! # Features
//!
//! - Heartbeat pings with a pong watchdog
//! - Automatic reconnect with linear backoff and an attempt ceiling
//! - Client-side rate limiting over a rolling window
//! - Listener dispatch isolated from listener failures
//! - Injectable transport trait for testing

mod endpoint;
mod manager;
mod rate_limit;
mod registry;
mod session;
mod transport;

pub use endpoint::Endpoint;
pub use manager::{
    ConnectOutcome, ConnectionManager, ObserverId, SendError, SendResult, StatusObserver,
    TransportFactory,
};
pub use rate_limit::{RateLimiter, RateWindow};
pub use registry::{invoke_all, HandlerRegistry, Listener, ListenerError, ListenerId, ListenerResult};
pub use transport::{FrameFuture, Transport, TransportError, TransportResult, WebSocketTransport};

#[cfg(test)]
pub(crate) mod transport_tests;
