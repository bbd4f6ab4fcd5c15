// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The outbound queue and its processing passes.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pulse_core::{ClockSource, MessageStatus, QueuedMessage, SystemClock};

use super::delivery::{Delivery, DeliveryResult};
use super::store::{decode_messages, encode_messages, QueueStore};
use super::{QueueError, QueueResult};
use crate::config::QueueConfig;

/// Callback receiving a full snapshot after every mutation.
pub type QueueListener = Arc<dyn Fn(&[QueuedMessage]) + Send + Sync>;

/// Durable, retrying queue of outbound messages.
///
/// Cheap to clone; clones share the same queue. Must be opened within a
/// tokio runtime.
#[derive(Clone)]
pub struct OutboundQueue {
    inner: Arc<Inner>,
}

struct Inner {
    config: QueueConfig,
    store: Box<dyn QueueStore>,
    delivery: Arc<dyn Delivery>,
    clock: Box<dyn ClockSource>,
    online: watch::Receiver<bool>,
    state: Mutex<State>,
    processing: AtomicBool,
    cancel: CancellationToken,
}

#[derive(Default)]
struct State {
    messages: Vec<QueuedMessage>,
    listeners: Vec<(u64, QueueListener)>,
    next_listener: u64,
}

/// Clears the in-flight flag when a pass ends, however it ends.
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl OutboundQueue {
    /// Opens the queue, recovering persisted messages.
    ///
    /// `online` drives processing: a pass runs whenever it flips to true.
    pub fn open(
        config: QueueConfig,
        store: impl QueueStore + 'static,
        delivery: Arc<dyn Delivery>,
        online: watch::Receiver<bool>,
    ) -> QueueResult<Self> {
        Self::open_with_clock(config, store, delivery, online, SystemClock)
    }

    /// Opens the queue with a custom clock (for testing).
    pub fn open_with_clock(
        config: QueueConfig,
        store: impl QueueStore + 'static,
        delivery: Arc<dyn Delivery>,
        online: watch::Receiver<bool>,
        clock: impl ClockSource + 'static,
    ) -> QueueResult<Self> {
        let mut messages = match store.load()? {
            Some(contents) => decode_messages(&contents),
            None => Vec::new(),
        };
        let recovered = messages
            .iter_mut()
            .map(QueuedMessage::recover_interrupted)
            .filter(|&recovered| recovered)
            .count();

        let queue = OutboundQueue {
            inner: Arc::new(Inner {
                config,
                store: Box::new(store),
                delivery,
                clock: Box::new(clock),
                online,
                state: Mutex::new(State {
                    messages,
                    ..State::default()
                }),
                processing: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
        };

        if recovered > 0 {
            info!(recovered, "reset interrupted sends to pending");
            queue.persist(&queue.lock().messages)?;
        }
        debug!(messages = queue.len(), "outbound queue opened");

        queue.spawn_connectivity_watch();
        Ok(queue)
    }

    /// Adds a pending message and returns its id.
    ///
    /// Starts a processing pass when online.
    pub fn enqueue(
        &self,
        message: Value,
        session_id: Option<String>,
        context: Option<Value>,
    ) -> QueueResult<String> {
        let queued = QueuedMessage::create(&*self.inner.clock, message, session_id, context);
        let id = queued.id.clone();
        self.mutate(|messages| {
            messages.push(queued);
            Ok(())
        })?;
        debug!(id = %id, "message enqueued");
        self.spawn_pass();
        Ok(id)
    }

    /// Attempts delivery of every deliverable message, then prunes sent
    /// ones. Returns the number delivered.
    ///
    /// A no-op while offline or while another pass is running.
    pub async fn process_queue(&self) -> QueueResult<usize> {
        if !self.is_online() {
            debug!("offline, skipping queue pass");
            return Ok(0);
        }
        if self.inner.processing.swap(true, Ordering::AcqRel) {
            debug!("queue pass already running");
            return Ok(0);
        }
        let _guard = ProcessingGuard(&self.inner.processing);

        let max = self.inner.config.max_retry_count;
        let ids: Vec<String> = self
            .lock()
            .messages
            .iter()
            .filter(|m| m.is_deliverable(max))
            .map(|m| m.id.clone())
            .collect();

        let mut delivered = 0;
        for id in ids {
            if !self.is_online() {
                debug!("went offline, stopping queue pass");
                break;
            }
            if self.process_message(&id).await? {
                delivered += 1;
            }
        }

        self.mutate(|messages| {
            messages.retain(|m| m.status != MessageStatus::Sent);
            Ok(())
        })?;
        if delivered > 0 {
            info!(delivered, "queued messages delivered");
        }
        Ok(delivered)
    }

    /// Delivers one message. Returns true if it was sent.
    async fn process_message(&self, id: &str) -> QueueResult<bool> {
        let max = self.inner.config.max_retry_count;
        let mut message = None;
        self.mutate(|messages| {
            if let Some(m) = messages.iter_mut().find(|m| m.id == id) {
                if m.is_deliverable(max) {
                    m.begin_send();
                    message = Some(m.clone());
                }
            }
            Ok(())
        })?;
        let Some(message) = message else {
            return Ok(false);
        };

        let outcome = self.inner.delivery.deliver(&message).await;
        self.record_outcome(id, outcome).await.inspect_err(|_| self.release(id))
    }

    async fn record_outcome(&self, id: &str, outcome: DeliveryResult) -> QueueResult<bool> {
        let max = self.inner.config.max_retry_count;
        match outcome {
            Ok(()) => {
                self.update(id, QueuedMessage::mark_sent)?;
                debug!(id, "message sent");
                Ok(true)
            }
            Err(e) => {
                let error = e.to_string();
                let mut retry_count = None;
                self.update(id, |m| {
                    if !m.record_failure(error.clone(), max) {
                        retry_count = Some(m.retry_count);
                    }
                })?;
                match retry_count {
                    Some(retry_count) => {
                        let delay = self.inner.config.retry_delay(retry_count);
                        warn!(id, retry_count, error = %error, "delivery failed, will retry");
                        tokio::time::sleep(delay).await;
                    }
                    None => warn!(id, error = %error, "delivery failed permanently"),
                }
                Ok(false)
            }
        }
    }

    /// Marks a message delivered by a caller-managed path.
    pub fn mark_as_sent(&self, id: &str) -> QueueResult<()> {
        self.update_existing(id, QueuedMessage::mark_sent)
    }

    /// Records a failed attempt reported by a caller-managed path.
    ///
    /// Counts against the retry budget like a failed pass would.
    pub fn mark_as_failed(&self, id: &str, error: &str) -> QueueResult<()> {
        let max = self.inner.config.max_retry_count;
        self.update_existing(id, |m| {
            m.record_failure(error, max);
        })
    }

    /// Returns a failed message to `pending` with a fresh retry budget.
    pub fn retry(&self, id: &str) -> QueueResult<()> {
        self.mutate(|messages| {
            let message = messages
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
            if message.status != MessageStatus::Failed {
                return Err(QueueError::NotRetryable {
                    id: id.to_string(),
                    status: message.status,
                });
            }
            message.reset_for_retry();
            Ok(())
        })?;
        info!(id, "retrying failed message");
        self.spawn_pass();
        Ok(())
    }

    /// Drops a message regardless of status.
    pub fn remove(&self, id: &str) -> QueueResult<()> {
        self.mutate(|messages| {
            let index = messages
                .iter()
                .position(|m| m.id == id)
                .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
            messages.remove(index);
            Ok(())
        })
    }

    /// Drops every message.
    pub fn clear(&self) -> QueueResult<()> {
        self.mutate(|messages| {
            messages.clear();
            Ok(())
        })
    }

    /// Snapshot of all messages in enqueue order.
    pub fn get_queue(&self) -> Vec<QueuedMessage> {
        self.lock().messages.clone()
    }

    /// Number of messages waiting for delivery.
    pub fn get_pending_count(&self) -> usize {
        self.lock()
            .messages
            .iter()
            .filter(|m| m.status == MessageStatus::Pending)
            .count()
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().messages.is_empty()
    }

    /// Registers a snapshot listener.
    pub fn subscribe<F>(&self, listener: F) -> QueueSubscription
    where
        F: Fn(&[QueuedMessage]) + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let id = state.next_listener;
        state.next_listener += 1;
        state.listeners.push((id, Arc::new(listener)));
        QueueSubscription {
            queue: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Stops the connectivity watch. Passes already running finish.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_online(&self) -> bool {
        *self.inner.online.borrow()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock()
    }

    /// Applies a mutation to a copy of the set, persists the copy, and
    /// swaps it in only once the save succeeds. Listeners are notified
    /// outside the lock.
    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut Vec<QueuedMessage>) -> QueueResult<R>,
    ) -> QueueResult<R> {
        let (result, snapshot, listeners) = {
            let mut state = self.lock();
            let mut next = state.messages.clone();
            let result = f(&mut next)?;
            self.persist(&next)?;
            state.messages = next;
            let listeners: Vec<QueueListener> =
                state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (result, state.messages.clone(), listeners)
        };
        for listener in listeners {
            listener(&snapshot);
        }
        Ok(result)
    }

    /// Returns an in-flight message to `pending` in memory only, matching
    /// what startup recovery does with the persisted `sending` record.
    fn release(&self, id: &str) {
        if let Some(m) = self.lock().messages.iter_mut().find(|m| m.id == id) {
            m.recover_interrupted();
        }
    }

    /// Updates a message if it is still queued.
    fn update(&self, id: &str, f: impl FnOnce(&mut QueuedMessage)) -> QueueResult<()> {
        self.mutate(|messages| {
            if let Some(m) = messages.iter_mut().find(|m| m.id == id) {
                f(m);
            }
            Ok(())
        })
    }

    fn update_existing(&self, id: &str, f: impl FnOnce(&mut QueuedMessage)) -> QueueResult<()> {
        self.mutate(|messages| {
            let message = messages
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
            f(message);
            Ok(())
        })
    }

    fn persist(&self, messages: &[QueuedMessage]) -> QueueResult<()> {
        let contents = encode_messages(messages)?;
        self.inner.store.save(&contents)
    }

    fn spawn_pass(&self) {
        if !self.is_online() {
            return;
        }
        let queue = self.clone();
        tokio::spawn(async move {
            if let Err(e) = queue.process_queue().await {
                warn!(error = %e, "queue pass failed");
            }
        });
    }

    fn spawn_connectivity_watch(&self) {
        let weak = Arc::downgrade(&self.inner);
        let cancel = self.inner.cancel.clone();
        let mut online = self.inner.online.clone();
        tokio::spawn(async move {
            loop {
                if *online.borrow_and_update() {
                    let Some(inner) = weak.upgrade() else { return };
                    let queue = OutboundQueue { inner };
                    debug!("online, processing queue");
                    if let Err(e) = queue.process_queue().await {
                        warn!(error = %e, "queue pass failed");
                    }
                }
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    changed = online.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }
        });
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for OutboundQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundQueue")
            .field("messages", &self.len())
            .field("online", &self.is_online())
            .finish()
    }
}

/// Registration of a snapshot listener.
#[derive(Debug)]
pub struct QueueSubscription {
    queue: Weak<Inner>,
    id: Option<u64>,
}

impl QueueSubscription {
    /// Removes the listener. Idempotent.
    pub fn unsubscribe(&mut self) {
        let (Some(id), Some(inner)) = (self.id.take(), self.queue.upgrade()) else {
            return;
        };
        inner.lock().listeners.retain(|(existing, _)| *existing != id);
    }
}
