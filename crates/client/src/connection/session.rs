// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session task: one connection lifetime plus its reconnect loop.
//!
//! The task owns the transport. Heartbeat, watchdog and backoff timers all
//! live inside its `select!` loop, so cancelling the token stops every
//! timer at once and none can fire after teardown.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use pulse_core::{ConnectionStatus, Inbound, InboundEnvelope, OutboundEnvelope, StatusChange};

use super::manager::{OutboundFrame, Shared, TransportFactory};
use super::registry::invoke_all;
use super::transport::Transport;

/// Buffered outbound frames per connection.
const OUTBOUND_BUFFER: usize = 32;

/// How a single connection lifetime ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ended {
    /// The connection closed, failed, or was torn down by the watchdog.
    Closed,
    /// The manager cancelled the session.
    Cancelled,
}

pub(super) struct Session<T: Transport> {
    shared: Arc<Shared>,
    factory: TransportFactory<T>,
    url: String,
    cancel: CancellationToken,
    generation: u64,
}

impl<T: Transport + 'static> Session<T> {
    pub(super) fn new(
        shared: Arc<Shared>,
        factory: TransportFactory<T>,
        url: String,
        cancel: CancellationToken,
        generation: u64,
    ) -> Self {
        Session {
            shared,
            factory,
            url,
            cancel,
            generation,
        }
    }

    /// Dials, runs, and redials with linear backoff until cancelled or out
    /// of attempts.
    pub(super) async fn run(self) {
        loop {
            if self.run_connection().await == Ended::Cancelled {
                return;
            }
            self.shared
                .set_status(StatusChange::new(ConnectionStatus::Disconnected));

            let Some(attempt) = self.shared.next_attempt(self.generation) else {
                if !self.cancel.is_cancelled() {
                    error!(
                        attempts = self.shared.config.max_reconnect_attempts,
                        "realtime server unreachable, giving up on reconnect"
                    );
                    self.shared.session_ended(self.generation);
                }
                return;
            };

            let delay = self.shared.config.backoff_delay(attempt);
            info!(attempt, delay_ms = delay.as_millis() as u64, "reconnecting");
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = time::sleep(delay) => {}
            }
        }
    }

    async fn run_connection(&self) -> Ended {
        let mut transport = (self.factory)();
        self.shared
            .set_status(StatusChange::new(ConnectionStatus::Connecting));

        let dialed = tokio::select! {
            _ = self.cancel.cancelled() => return Ended::Cancelled,
            result = transport.connect(&self.url) => result,
        };
        if let Err(e) = dialed {
            warn!(error = %e, "connection attempt failed");
            self.shared.set_status(StatusChange::error(e.to_string()));
            return Ended::Closed;
        }

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<OutboundFrame>(OUTBOUND_BUFFER);
        if !self.shared.opened(self.generation, outbound_tx) {
            let _ = transport.disconnect().await;
            return Ended::Cancelled;
        }
        info!("realtime connection open");

        let heartbeat_every = self.shared.config.heartbeat_interval();
        let timeout = self.shared.config.connection_timeout();
        let mut heartbeat = time::interval_at(Instant::now() + heartbeat_every, heartbeat_every);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let watchdog = time::sleep(timeout);
        tokio::pin!(watchdog);

        let ended = loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break Ended::Cancelled,

                frame = transport.recv() => match frame {
                    Ok(Some(text)) => {
                        if self.handle_frame(&text) {
                            watchdog.as_mut().reset(Instant::now() + timeout);
                        }
                    }
                    Ok(None) => {
                        info!("realtime connection closed by server");
                        break Ended::Closed;
                    }
                    Err(e) => {
                        warn!(error = %e, "realtime connection failed");
                        self.shared.set_status(StatusChange::error(e.to_string()));
                        break Ended::Closed;
                    }
                },

                () = &mut watchdog => {
                    warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        "no heartbeat acknowledgement in time, tearing down connection"
                    );
                    break Ended::Closed;
                }

                _ = heartbeat.tick() => {
                    match OutboundEnvelope::ping().to_json() {
                        Ok(ping) => {
                            if let Err(e) = transport.send(ping).await {
                                warn!(error = %e, "heartbeat send failed");
                            }
                        }
                        Err(e) => warn!(error = %e, "failed to encode heartbeat"),
                    }
                }

                Some(outbound) = outbound_rx.recv() => {
                    let result = transport.send(outbound.frame).await;
                    // The sender may have given up waiting
                    let _ = outbound.reply.send(result);
                }
            }
        };

        self.shared.closed(self.generation);
        if let Err(e) = transport.disconnect().await {
            debug!(error = %e, "error while closing transport");
        }
        ended
    }

    /// Parses and dispatches one inbound frame. Returns true for a pong.
    fn handle_frame(&self, text: &str) -> bool {
        let envelope = match InboundEnvelope::from_json(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "dropping malformed frame");
                return false;
            }
        };

        match envelope.classify() {
            Inbound::Pong { timestamp } => {
                debug!(timestamp = timestamp.as_deref().unwrap_or(""), "heartbeat acknowledged");
                true
            }
            Inbound::RateLimited {
                message,
                retry_after,
            } => {
                warn!(
                    retry_after,
                    message = message.as_deref().unwrap_or(""),
                    "server rate limit signalled"
                );
                false
            }
            Inbound::Event { kind, data } => {
                let listeners = self.shared.listeners(&kind);
                if listeners.is_empty() {
                    debug!(kind = %kind, "no listeners for event");
                } else {
                    invoke_all(&kind, &listeners, &data);
                }
                false
            }
        }
    }
}
