// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Listener registry keyed by inbound frame type.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, warn};

/// Error a listener may report; logged and otherwise ignored.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by listeners.
pub type ListenerResult = Result<(), ListenerError>;

/// A callback receiving the `data` payload of matching frames.
pub type Listener = Arc<dyn Fn(&Value) -> ListenerResult + Send + Sync>;

/// Handle identifying one registration, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered listeners per frame type.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener for `kind`.
    pub fn add(&mut self, kind: &str, listener: Listener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.handlers
            .entry(kind.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    /// Removes one listener. The type entry is dropped once it has no
    /// listeners left.
    ///
    /// Returns false if the listener was not registered.
    pub fn remove(&mut self, kind: &str, id: ListenerId) -> bool {
        let Some(listeners) = self.handlers.get_mut(kind) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        let removed = listeners.len() != before;
        if listeners.is_empty() {
            self.handlers.remove(kind);
        }
        removed
    }

    /// Snapshot of the listeners for `kind`, in registration order.
    pub fn listeners(&self, kind: &str) -> Vec<Listener> {
        self.handlers
            .get(kind)
            .map(|ls| ls.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default()
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: &str) -> usize {
        self.handlers.get(kind).map_or(0, Vec::len)
    }

    /// Number of frame types with at least one listener.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

/// Invokes every listener with `data`, isolating failures.
///
/// A listener that returns an error or panics is logged; the remaining
/// listeners still run. Returns the number of listeners that failed.
pub fn invoke_all(kind: &str, listeners: &[Listener], data: &Value) -> usize {
    let mut failures = 0;
    for listener in listeners {
        match catch_unwind(AssertUnwindSafe(|| listener(data))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                failures += 1;
                warn!("listener for '{}' failed: {}", kind, e);
            }
            Err(_) => {
                failures += 1;
                error!("listener for '{}' panicked", kind);
            }
        }
    }
    failures
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
