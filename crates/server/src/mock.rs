//! Controllable in-memory implementations of the capability traits.
//!
//! [`MockChat`] and [`MockLedger`] let the workflow be exercised without a
//! real messaging transport or chain:
//!
//! - **Scripted state**: membership statuses, registered target names,
//!   source-network accounts and their keys
//! - **Failure injection**: make the next N submits fail
//! - **Delay injection**: slow down submits to hold the single-flight gate
//!   open in concurrency tests
//! - **Request counting**: assert that a rejected request issued no ledger
//!   call

use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::RwLock;
use signupd_types::{ChatId, MembershipStatus, RequesterId, Result, error::LedgerSnafu};

use crate::{
    chat::ChatApi,
    ledger::{AccountKeys, Action, LedgerApi},
};

/// Mock messaging transport recording every sent message.
#[derive(Debug, Default)]
pub struct MockChat {
    statuses: RwLock<HashMap<(ChatId, RequesterId), MembershipStatus>>,
    sent: RwLock<Vec<(ChatId, String)>>,
    send_count: AtomicUsize,
}

impl MockChat {
    /// Creates a transport where every unknown user is a regular member.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the membership status returned for `(chat, requester)`.
    pub fn set_status(&self, chat: ChatId, requester: RequesterId, status: MembershipStatus) {
        self.statuses.write().insert((chat, requester), status);
    }

    /// All messages sent so far, in order.
    #[must_use]
    pub fn sent_messages(&self) -> Vec<(ChatId, String)> {
        self.sent.read().clone()
    }

    /// Messages sent to `chat`, in order.
    #[must_use]
    pub fn messages_to(&self, chat: ChatId) -> Vec<String> {
        self.sent.read().iter().filter(|(c, _)| *c == chat).map(|(_, t)| t.clone()).collect()
    }

    /// Total number of send calls.
    #[must_use]
    pub fn send_count(&self) -> usize {
        self.send_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChatApi for MockChat {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<()> {
        self.send_count.fetch_add(1, Ordering::Relaxed);
        self.sent.write().push((chat, text.to_string()));
        Ok(())
    }

    async fn member_status(
        &self,
        chat: ChatId,
        requester: RequesterId,
    ) -> Result<MembershipStatus> {
        Ok(self
            .statuses
            .read()
            .get(&(chat, requester))
            .copied()
            .unwrap_or(MembershipStatus::Member))
    }
}

/// Mock ledger with scripted accounts and controllable submit behavior.
#[derive(Debug, Default)]
pub struct MockLedger {
    /// Names registered on the target network.
    registered: RwLock<HashSet<String>>,
    /// Source-network accounts and their permission keys.
    source_accounts: RwLock<HashMap<String, AccountKeys>>,
    /// Number of upcoming submits to fail.
    fail_submits: AtomicUsize,
    /// Delay injected before each submit completes (milliseconds).
    submit_delay_ms: AtomicU64,
    /// Action bundles accepted so far.
    submitted: RwLock<Vec<Vec<Action>>>,
    submit_count: AtomicUsize,
    exists_count: AtomicUsize,
}

impl MockLedger {
    /// Creates an empty ledger: no registered names, no source accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `name` as registered on the target network.
    pub fn register(&self, name: &str) {
        self.registered.write().insert(name.to_string());
    }

    /// Scripts a source-network account with the given keys.
    pub fn set_source_account(&self, name: &str, keys: AccountKeys) {
        self.source_accounts.write().insert(name.to_string(), keys);
    }

    /// Makes the next `n` submits fail with a ledger error.
    pub fn fail_next_submits(&self, n: usize) {
        self.fail_submits.store(n, Ordering::SeqCst);
    }

    /// Injects a delay before each submit completes.
    pub fn set_submit_delay(&self, delay: Duration) {
        self.submit_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of submits attempted (including injected failures).
    #[must_use]
    pub fn submit_count(&self) -> usize {
        self.submit_count.load(Ordering::SeqCst)
    }

    /// Number of existence checks performed.
    #[must_use]
    pub fn exists_count(&self) -> usize {
        self.exists_count.load(Ordering::SeqCst)
    }

    /// Action bundles accepted so far.
    #[must_use]
    pub fn submitted(&self) -> Vec<Vec<Action>> {
        self.submitted.read().clone()
    }
}

#[async_trait]
impl LedgerApi for MockLedger {
    async fn account_exists(&self, name: &str) -> Result<bool> {
        self.exists_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.registered.read().contains(name))
    }

    async fn account_keys(&self, name: &str) -> Result<Option<AccountKeys>> {
        Ok(self.source_accounts.read().get(name).cloned())
    }

    async fn submit(&self, actions: Vec<Action>) -> Result<()> {
        let delay_ms = self.submit_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        self.submit_count.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_submits.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_submits.store(remaining - 1, Ordering::SeqCst);
            return LedgerSnafu { message: "injected submit failure" }.fail();
        }

        self.submitted.write().push(actions);
        Ok(())
    }
}
