// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection manager: the public handle over one session task.
//!
//! Provides a high-level interface for:
//! - Opening (or sharing) the realtime connection
//! - Sending rate-limited frames
//! - Registering listeners per event type
//! - Observing connection status and connectivity

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pulse_core::{ConnectionStatus, OutboundEnvelope, StatusChange};

use super::endpoint::Endpoint;
use super::rate_limit::RateLimiter;
use super::registry::{HandlerRegistry, Listener, ListenerId, ListenerResult};
use super::session::Session;
use super::transport::{Transport, TransportError, TransportResult, WebSocketTransport};
use crate::config::ConnectionConfig;
use crate::error::Result;

/// Error type for [`ConnectionManager::send`].
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// No open connection.
    #[error("not connected to the realtime server")]
    NotConnected,

    /// The client-side rate limit window is exhausted.
    #[error("rate limit exceeded: at most {limit} messages per window")]
    RateLimited {
        /// Sends allowed per window.
        limit: u32,
    },

    /// The transport rejected the frame.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for send operations.
pub type SendResult<T> = std::result::Result<T, SendError>;

/// What [`ConnectionManager::connect`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A new session was started for the endpoint.
    Opened,
    /// A session was already live; the request shares it.
    Shared {
        /// Endpoint of the live session.
        active: Endpoint,
    },
}

/// Callback notified on every status transition.
pub type StatusObserver = Arc<dyn Fn(&StatusChange) + Send + Sync>;

/// Handle for removing a status observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Builds a fresh transport for each dial.
pub type TransportFactory<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// A frame waiting for the session task to transmit it.
pub(super) struct OutboundFrame {
    pub(super) frame: String,
    pub(super) reply: oneshot::Sender<TransportResult<()>>,
}

/// State shared between the handle and the session task.
pub(super) struct Shared {
    pub(super) config: ConnectionConfig,
    state: Mutex<State>,
    status_tx: watch::Sender<ConnectionStatus>,
    online_tx: watch::Sender<bool>,
}

struct State {
    status: ConnectionStatus,
    registry: HandlerRegistry,
    observers: Vec<(ObserverId, StatusObserver)>,
    next_observer: u64,
    limiter: RateLimiter,
    attempts: u32,
    endpoint: Option<Endpoint>,
    session: Option<SessionHandle>,
    outbound: Option<mpsc::Sender<OutboundFrame>>,
    generation: u64,
}

struct SessionHandle {
    generation: u64,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl Shared {
    fn new(config: ConnectionConfig) -> Self {
        let limiter = RateLimiter::new(
            config.send_ceiling(),
            config.rate_limit_window(),
            Instant::now(),
        );
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        let (online_tx, _) = watch::channel(false);
        Shared {
            config,
            state: Mutex::new(State {
                status: ConnectionStatus::Disconnected,
                registry: HandlerRegistry::new(),
                observers: Vec::new(),
                next_observer: 0,
                limiter,
                attempts: 0,
                endpoint: None,
                session: None,
                outbound: None,
                generation: 0,
            }),
            status_tx,
            online_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a transition and notifies observers outside the lock.
    ///
    /// Repeating the current status is a no-op, except for errors whose
    /// message is always reported.
    pub(super) fn set_status(&self, change: StatusChange) {
        let observers: Vec<StatusObserver> = {
            let mut state = self.lock();
            if state.status == change.status && change.status != ConnectionStatus::Error {
                return;
            }
            state.status = change.status;
            state.observers.iter().map(|(_, o)| Arc::clone(o)).collect()
        };
        debug!(status = %change, "connection status changed");
        self.status_tx.send_replace(change.status);
        for observer in observers {
            observer(&change);
        }
    }

    fn set_online(&self, online: bool) {
        self.online_tx.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
    }

    /// On open: clears the attempt counter and accepts outbound frames.
    pub(super) fn opened(&self, generation: u64, outbound: mpsc::Sender<OutboundFrame>) -> bool {
        {
            let mut state = self.lock();
            if state.generation != generation {
                return false;
            }
            state.attempts = 0;
            state.outbound = Some(outbound);
        }
        self.set_status(StatusChange::new(ConnectionStatus::Connected));
        self.set_online(true);
        true
    }

    /// On close: stops accepting outbound frames.
    pub(super) fn closed(&self, generation: u64) {
        {
            let mut state = self.lock();
            if state.generation != generation {
                return;
            }
            state.outbound = None;
        }
        self.set_online(false);
    }

    /// Claims the next reconnect attempt, or `None` once the ceiling is hit.
    pub(super) fn next_attempt(&self, generation: u64) -> Option<u32> {
        let mut state = self.lock();
        if state.generation != generation || state.attempts >= self.config.max_reconnect_attempts {
            return None;
        }
        state.attempts += 1;
        Some(state.attempts)
    }

    /// Drops the handle of a session that ended on its own.
    pub(super) fn session_ended(&self, generation: u64) {
        let mut state = self.lock();
        if state.session.as_ref().is_some_and(|s| s.generation == generation) {
            state.session = None;
        }
    }

    /// Snapshot of the listeners registered for `kind`.
    pub(super) fn listeners(&self, kind: &str) -> Vec<Listener> {
        self.lock().registry.listeners(kind)
    }
}

/// Handle to the realtime connection.
///
/// Cheap to clone; every clone drives the same connection. Must be used from
/// within a tokio runtime.
pub struct ConnectionManager<T: Transport = WebSocketTransport> {
    shared: Arc<Shared>,
    factory: TransportFactory<T>,
}

impl<T: Transport> Clone for ConnectionManager<T> {
    fn clone(&self) -> Self {
        ConnectionManager {
            shared: Arc::clone(&self.shared),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T: Transport + 'static> fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("status", &self.status())
            .field("endpoint", &self.current_endpoint())
            .finish()
    }
}

impl ConnectionManager<WebSocketTransport> {
    /// Creates a manager that dials over WebSocket.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_transport_factory(config, Arc::new(WebSocketTransport::new))
    }
}

impl<T: Transport + 'static> ConnectionManager<T> {
    /// Creates a manager with a custom transport (for testing).
    pub fn with_transport_factory(config: ConnectionConfig, factory: TransportFactory<T>) -> Self {
        ConnectionManager {
            shared: Arc::new(Shared::new(config)),
            factory,
        }
    }

    /// Connection settings in use.
    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    /// Opens the connection, or shares the live one.
    ///
    /// A session that is open, dialing, or waiting out a backoff counts as
    /// live. Only one connection exists per manager, so a request for a
    /// different endpoint shares the live session and logs a warning.
    pub fn connect(&self, endpoint: &Endpoint, token: Option<&str>) -> Result<ConnectOutcome> {
        let mut state = self.shared.lock();
        if state.session.is_some() {
            let active = state.endpoint.clone().unwrap_or_else(|| endpoint.clone());
            if active != *endpoint {
                warn!(
                    requested = %endpoint,
                    active = %active,
                    "connection already open for another endpoint; sharing it"
                );
            }
            return Ok(ConnectOutcome::Shared { active });
        }

        let url = endpoint.to_url(&self.shared.config.base_url, token)?;
        state.generation += 1;
        state.attempts = 0;
        state.endpoint = Some(endpoint.clone());

        let generation = state.generation;
        let cancel = CancellationToken::new();
        let session = Session::new(
            Arc::clone(&self.shared),
            Arc::clone(&self.factory),
            url,
            cancel.clone(),
            generation,
        );
        info!(endpoint = %endpoint, "opening realtime connection");
        let join = tokio::spawn(session.run());
        state.session = Some(SessionHandle {
            generation,
            cancel,
            join,
        });
        Ok(ConnectOutcome::Opened)
    }

    /// Sends a frame through the open connection.
    ///
    /// Non-heartbeat frames count against the rate limit; a send over the
    /// ceiling is rejected, never queued.
    pub async fn send(&self, kind: &str, data: Option<Value>) -> SendResult<()> {
        let envelope = OutboundEnvelope::new(kind, data);
        let heartbeat = envelope.is_heartbeat();
        let frame = envelope
            .to_json()
            .map_err(|e| SendError::Transport(TransportError::Write(e.to_string())))?;

        let outbound = {
            let mut state = self.shared.lock();
            let outbound = state.outbound.clone().ok_or(SendError::NotConnected)?;
            if !heartbeat && !state.limiter.check(Instant::now()) {
                let limit = state.limiter.ceiling();
                warn!(kind, limit, "client rate limit reached, dropping message");
                return Err(SendError::RateLimited { limit });
            }
            outbound
        };

        let (reply, response) = oneshot::channel();
        outbound
            .send(OutboundFrame { frame, reply })
            .await
            .map_err(|_| SendError::NotConnected)?;
        response.await.map_err(|_| SendError::NotConnected)??;

        if !heartbeat {
            self.shared.lock().limiter.record(Instant::now());
        }
        Ok(())
    }

    /// Tears down the session and resets all per-connection state.
    ///
    /// Idempotent.
    pub async fn disconnect(&self) {
        let session = {
            let mut state = self.shared.lock();
            state.generation += 1;
            state.registry.clear();
            state.limiter.reset(Instant::now());
            state.attempts = 0;
            state.endpoint = None;
            state.outbound = None;
            state.session.take()
        };

        if let Some(session) = session {
            session.cancel.cancel();
            if let Err(e) = session.join.await {
                warn!(error = %e, "session task ended abnormally");
            }
            info!("realtime connection closed");
        }

        self.shared.set_online(false);
        self.shared
            .set_status(StatusChange::new(ConnectionStatus::Disconnected));
    }

    /// Registers a listener for an event type.
    pub fn add_listener<F>(&self, kind: &str, listener: F) -> ListenerId
    where
        F: Fn(&Value) -> ListenerResult + Send + Sync + 'static,
    {
        self.shared.lock().registry.add(kind, Arc::new(listener))
    }

    /// Removes one listener. Returns false if it was not registered.
    pub fn remove_listener(&self, kind: &str, id: ListenerId) -> bool {
        self.shared.lock().registry.remove(kind, id)
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: &str) -> usize {
        self.shared.lock().registry.listener_count(kind)
    }

    /// Registers a status observer.
    pub fn on_status<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&StatusChange) + Send + Sync + 'static,
    {
        let mut state = self.shared.lock();
        let id = ObserverId(state.next_observer);
        state.next_observer += 1;
        state.observers.push((id, Arc::new(observer)));
        id
    }

    /// Removes a status observer. Returns false if it was not registered.
    pub fn remove_status_observer(&self, id: ObserverId) -> bool {
        let mut state = self.shared.lock();
        let before = state.observers.len();
        state.observers.retain(|(existing, _)| *existing != id);
        state.observers.len() != before
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.shared.lock().status
    }

    /// Receiver tracking the current status.
    pub fn status_watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status_tx.subscribe()
    }

    /// Receiver that is `true` while connected.
    pub fn connectivity(&self) -> watch::Receiver<bool> {
        self.shared.online_tx.subscribe()
    }

    /// Automatic reconnect attempts since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.lock().attempts
    }

    /// True while a connection is open.
    pub fn is_connected(&self) -> bool {
        let state = self.shared.lock();
        state.status == ConnectionStatus::Connected && state.outbound.is_some()
    }

    /// Endpoint of the live (or most recent) session.
    pub fn current_endpoint(&self) -> Option<Endpoint> {
        self.shared.lock().endpoint.clone()
    }
}
