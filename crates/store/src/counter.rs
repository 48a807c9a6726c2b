//! The persisted premium-name counter.
//!
//! A single `{counter: n}` record. The value is re-read from disk on every
//! access so the file stays authoritative; the allocator owns the meaning
//! ("next name to try") and the exactly-once advance discipline.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{error::Result, kv::JsonFile};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CounterRecord {
    counter: u64,
}

/// Durable monotonic counter.
///
/// Invariant: non-decreasing; never reset by this system ([`set`] exists for
/// operator intervention only).
///
/// [`set`]: CounterStore::set
#[derive(Debug)]
pub struct CounterStore {
    file: JsonFile<CounterRecord>,
    // Keeps the read-modify-write of increment() atomic within the process.
    write_lock: Mutex<()>,
}

impl CounterStore {
    /// Opens the counter at `path`. A missing file means counter 0.
    pub fn open(path: impl Into<std::path::PathBuf>) -> Self {
        Self { file: JsonFile::new(path), write_lock: Mutex::new(()) }
    }

    /// Current counter value.
    ///
    /// An unreadable or corrupt file degrades to 0 with a logged warning;
    /// the allocator must never crash over its backing store.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.file.load().counter
    }

    /// Advances the counter by one.
    ///
    /// Write failures are logged at error level and swallowed: a lost
    /// advance reproduces the already-handled candidate-drift case, which is
    /// preferable to failing a creation that the ledger accepted.
    pub fn increment(&self) {
        let _guard = self.write_lock.lock();
        let next = self.file.load().counter + 1;
        if let Err(e) = self.file.store(&CounterRecord { counter: next }) {
            tracing::error!(error = %e, counter = next, "failed to persist premium counter");
        }
    }

    /// Overwrites the counter. Operator intervention only.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`](crate::StoreError) if the file write fails.
    pub fn set(&self, value: u64) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.file.store(&CounterRecord { counter: value })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use signupd_test_utils::TestDir;

    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let dir = TestDir::new();
        let store = CounterStore::open(dir.join("counter.json"));
        assert_eq!(store.value(), 0);
    }

    #[test]
    fn test_increment_persists() {
        let dir = TestDir::new();
        let path = dir.join("counter.json");
        {
            let store = CounterStore::open(&path);
            store.increment();
            store.increment();
            assert_eq!(store.value(), 2);
        }
        let reopened = CounterStore::open(&path);
        assert_eq!(reopened.value(), 2);
    }

    #[test]
    fn test_corrupt_record_degrades_to_zero() {
        let dir = TestDir::new();
        let path = dir.join("counter.json");
        std::fs::write(&path, b"{\"counter\": \"not a number\"}").unwrap();
        let store = CounterStore::open(&path);
        assert_eq!(store.value(), 0);
        // Increment resumes from the degraded value.
        store.increment();
        assert_eq!(store.value(), 1);
    }

    #[test]
    fn test_set_overwrites() {
        let dir = TestDir::new();
        let store = CounterStore::open(dir.join("counter.json"));
        store.set(649).unwrap();
        assert_eq!(store.value(), 649);
    }
}
