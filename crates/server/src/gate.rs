//! Single-flight gate around the creation transaction.
//!
//! The signer account is shared, so at most one creation transaction may be
//! outstanding at any time — across all requesters and all chats. Requests
//! arriving while the gate is held are rejected with a busy outcome, not
//! queued.
//!
//! The gate is in-memory only: a crash mid-transaction leaves no lingering
//! lock after restart.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Process-wide single-flight gate.
///
/// Clones share the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CreationGate {
    busy: Arc<AtomicBool>,
}

impl CreationGate {
    /// Creates a released gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to acquire the gate.
    ///
    /// Returns `None` if a creation is already in flight. The returned
    /// permit releases the gate when dropped, on every exit path including
    /// panics.
    #[must_use]
    pub fn try_acquire(&self) -> Option<CreationPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then(|| CreationPermit { busy: Arc::clone(&self.busy) })
    }

    /// Whether a creation is currently in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// RAII permit holding the gate; dropping it releases the gate.
#[derive(Debug)]
pub struct CreationPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for CreationPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
