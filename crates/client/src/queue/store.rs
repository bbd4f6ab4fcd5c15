// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence for the outbound queue.
//!
//! The whole queue is one JSON array stored under [`QUEUE_KEY`] and
//! overwritten on every mutation. Loading is lenient: records written by
//! older producers or damaged on disk are skipped, never fatal.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::warn;

use pulse_core::QueuedMessage;

use super::{QueueError, QueueResult};

/// Key of the persisted queue record.
pub const QUEUE_KEY: &str = "outbound_queue";

/// Storage for the serialized queue record.
pub trait QueueStore: Send + Sync {
    /// Returns the stored record, or `None` if nothing was saved yet.
    fn load(&self) -> QueueResult<Option<String>>;

    /// Replaces the stored record.
    fn save(&self, contents: &str) -> QueueResult<()>;
}

/// Stores the queue as `<dir>/outbound_queue.json`.
///
/// Writes go to a temp file that is fsynced and renamed over the record,
/// so a crash never leaves a half-written queue.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    /// Path of the queue record.
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{QUEUE_KEY}.json"))
    }

    fn temp_path(&self) -> PathBuf {
        self.dir.join(format!("{QUEUE_KEY}.json.tmp"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl QueueStore for FileStore {
    fn load(&self) -> QueueResult<Option<String>> {
        match fs::read_to_string(self.path()) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, contents: &str) -> QueueResult<()> {
        fs::create_dir_all(&self.dir)?;
        let temp = self.temp_path();
        let mut file = File::create(&temp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp, self.path())?;
        Ok(())
    }
}

/// In-memory store, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    contents: Option<String>,
    fail_saves: bool,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with a record.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let store = Self::new();
        store.lock().contents = Some(contents.into());
        store
    }

    /// Current record.
    pub fn contents(&self) -> Option<String> {
        self.lock().contents.clone()
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.lock().saves
    }

    /// Makes saves fail until cleared.
    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl QueueStore for MemoryStore {
    fn load(&self) -> QueueResult<Option<String>> {
        Ok(self.contents())
    }

    fn save(&self, contents: &str) -> QueueResult<()> {
        let mut state = self.lock();
        if state.fail_saves {
            return Err(QueueError::Store("memory store is read-only".into()));
        }
        state.contents = Some(contents.to_string());
        state.saves += 1;
        Ok(())
    }
}

/// Decodes a persisted record, skipping entries that cannot be read.
pub fn decode_messages(contents: &str) -> Vec<QueuedMessage> {
    if contents.trim().is_empty() {
        return Vec::new();
    }
    let entries = match serde_json::from_str::<Value>(contents) {
        Ok(Value::Array(entries)) => entries,
        Ok(other) => {
            warn!(kind = json_kind(&other), "persisted queue is not an array, starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "persisted queue is unreadable, starting empty");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<QueuedMessage>(entry) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(index, error = %e, "skipping unreadable queued message");
                None
            }
        })
        .collect()
}

/// Encodes the queue for storage.
pub(super) fn encode_messages(messages: &[QueuedMessage]) -> QueueResult<String> {
    Ok(serde_json::to_string(messages)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
