//! Request counter and bounded activity log.
//!
//! The counter and the buffer share one mutex: incrementing, appending and
//! truncating happen in a single critical section so concurrent ingestions
//! never lose an update or observe a half-truncated buffer.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::entry::LogEntry;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("log store lock poisoned")]
    Poisoned,
}

struct StoreInner {
    requests: u64,
    lines: VecDeque<String>,
}

/// Thread-safe log store. Cheap to clone (Arc).
#[derive(Clone)]
pub struct LogStore {
    capacity: usize,
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub requests: u64,
    pub entries: usize,
}

/// Point-in-time copy of the store, taken under the lock.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub requests: u64,
    pub capacity: usize,
    /// Rendered entries, oldest first.
    pub lines: Vec<String>,
}

impl LogStore {
    /// Create an empty store retaining at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Arc::new(Mutex::new(StoreInner {
                requests: 0,
                lines: VecDeque::with_capacity(capacity),
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Count one request and append the entry built for it.
    ///
    /// `build` receives the new request number and runs under the lock, so
    /// request numbers in the buffer are strictly increasing.
    pub fn record<F>(&self, build: F) -> Result<LogEntry, StoreError>
    where
        F: FnOnce(u64) -> LogEntry,
    {
        let mut inner = self.lock()?;
        inner.requests += 1;
        let entry = build(inner.requests);
        inner.lines.push_back(entry.to_string());
        while inner.lines.len() > self.capacity {
            inner.lines.pop_front();
        }
        Ok(entry)
    }

    /// Request and entry counts, read together.
    pub fn counts(&self) -> Result<StoreCounts, StoreError> {
        let inner = self.lock()?;
        Ok(StoreCounts {
            requests: inner.requests,
            entries: inner.lines.len(),
        })
    }

    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let inner = self.lock()?;
        Ok(StoreSnapshot {
            requests: inner.requests,
            capacity: self.capacity,
            lines: inner.lines.iter().cloned().collect(),
        })
    }

    /// Poison the lock by panicking while holding it.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let inner = self.inner.clone();
        let _ = std::thread::spawn(move || {
            let _guard = inner.lock().unwrap();
            panic!("poisoning log store");
        })
        .join();
    }
}
