//! The de-duplication ledger.
//!
//! [`BlacklistStore`] records every requester that has completed an account
//! creation. Membership is checked before a creation is attempted and
//! recorded only after the ledger confirmed success — and persisted before
//! success is reported, so a crash between persist and notification can
//! never produce a duplicate grant.
//!
//! Once present, an id is never removed by this system.

use std::collections::HashSet;

use parking_lot::RwLock;
use signupd_types::RequesterId;

use crate::{error::Result, kv::JsonFile};

/// Persisted set of requester ids that already created an account.
///
/// The full set is held in memory and mirrored to a JSON list on every
/// mutation. The workflow's single-flight gate is the only writer.
#[derive(Debug)]
pub struct BlacklistStore {
    file: JsonFile<Vec<RequesterId>>,
    members: RwLock<HashSet<RequesterId>>,
}

impl BlacklistStore {
    /// Opens the blacklist at `path`, loading any existing members.
    ///
    /// An unreadable or corrupt file degrades to an empty set with a logged
    /// warning; the service keeps running with reduced duplicate protection
    /// rather than refusing to start.
    pub fn open(path: impl Into<std::path::PathBuf>) -> Self {
        let file: JsonFile<Vec<RequesterId>> = JsonFile::new(path);
        let members = file.load().into_iter().collect();
        Self { file, members: RwLock::new(members) }
    }

    /// Whether `id` has already completed a creation.
    #[must_use]
    pub fn contains(&self, id: RequesterId) -> bool {
        self.members.read().contains(&id)
    }

    /// Records `id` as having completed a creation.
    ///
    /// Idempotent: adding a present id is a no-op. The in-memory insert is
    /// rolled back if the file write fails, so a later retry re-attempts the
    /// persist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`](crate::StoreError) if the file write fails.
    pub fn add(&self, id: RequesterId) -> Result<()> {
        let mut members = self.members.write();
        if !members.insert(id) {
            return Ok(());
        }
        let mut snapshot: Vec<RequesterId> = members.iter().copied().collect();
        snapshot.sort_unstable();
        if let Err(e) = self.file.store(&snapshot) {
            members.remove(&id);
            return Err(e);
        }
        Ok(())
    }

    /// Number of recorded requesters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    /// Whether no requester has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use signupd_test_utils::TestDir;

    use super::*;

    #[test]
    fn test_add_and_contains() {
        let dir = TestDir::new();
        let store = BlacklistStore::open(dir.join("blacklist.json"));
        let id = RequesterId::new(42);

        assert!(!store.contains(id));
        store.add(id).unwrap();
        assert!(store.contains(id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_is_idempotent() {
        let dir = TestDir::new();
        let store = BlacklistStore::open(dir.join("blacklist.json"));
        let id = RequesterId::new(7);

        store.add(id).unwrap();
        store.add(id).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_members_survive_reopen() {
        let dir = TestDir::new();
        let path = dir.join("blacklist.json");
        {
            let store = BlacklistStore::open(&path);
            store.add(RequesterId::new(1)).unwrap();
            store.add(RequesterId::new(2)).unwrap();
        }
        let reopened = BlacklistStore::open(&path);
        assert!(reopened.contains(RequesterId::new(1)));
        assert!(reopened.contains(RequesterId::new(2)));
        assert!(!reopened.contains(RequesterId::new(3)));
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let dir = TestDir::new();
        let path = dir.join("blacklist.json");
        std::fs::write(&path, b"][").unwrap();
        let store = BlacklistStore::open(&path);
        assert!(store.is_empty());
        // And stays writable afterwards.
        store.add(RequesterId::new(9)).unwrap();
        assert!(store.contains(RequesterId::new(9)));
    }
}
