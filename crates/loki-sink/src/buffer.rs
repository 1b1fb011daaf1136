// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory accumulation of log lines between flushes.
//!
//! Every line is stamped on arrival with a Unix timestamp in nanoseconds and
//! kept in insertion order. The buffer is only trimmed after a push has been
//! confirmed by Loki, and only by the number of entries that push carried, so
//! lines written while a push is in flight are kept for the next one.

use serde::ser::{Serialize, SerializeTuple, Serializer};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// A single `[timestamp, line]` pair as Loki expects it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// Unix time in nanoseconds, base 10.
    pub timestamp: String,
    pub line: String,
}

impl LogEntry {
    #[must_use]
    pub fn new(timestamp_nanos: u128, line: &[u8]) -> Self {
        LogEntry {
            timestamp: timestamp_nanos.to_string(),
            line: String::from_utf8_lossy(line).into_owned(),
        }
    }
}

impl Serialize for LogEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.timestamp)?;
        tuple.serialize_element(&self.line)?;
        tuple.end()
    }
}

/// Entries accumulated since the last confirmed flush, oldest first.
pub type Batch = Vec<LogEntry>;

#[derive(Debug, Default)]
struct Inner {
    entries: Batch,
    last_timestamp: u128,
}

/// Thread-safe append-only buffer of [`LogEntry`] values.
#[derive(Debug, Default)]
pub struct BatchBuffer {
    inner: Mutex<Inner>,
}

#[allow(clippy::expect_used)]
impl BatchBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps `line` with the current time and appends it. Returns `line.len()`.
    pub fn append(&self, line: &[u8]) -> usize {
        let now = unix_nanos();
        let mut inner = self.inner.lock().expect("lock poisoned");
        // Wall clock can step backwards; Loki rejects out of order entries per stream.
        let timestamp = now.max(inner.last_timestamp);
        inner.last_timestamp = timestamp;
        inner.entries.push(LogEntry::new(timestamp, line));
        line.len()
    }

    /// Copy of the pending entries. The buffer is left untouched.
    #[must_use]
    pub fn snapshot(&self) -> Batch {
        self.inner.lock().expect("lock poisoned").entries.clone()
    }

    /// Drops the `count` oldest entries, i.e. those carried by a confirmed push.
    pub fn clear(&self, count: usize) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let count = count.min(inner.entries.len());
        inner.entries.drain(..count);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("lock poisoned").entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn unix_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default()
}
