//! Anti-abuse eligibility checks.
//!
//! Two independent checks, both of which must pass:
//! - **Community standing**: the requester's membership status in a
//!   designated reference chat. `left`, `kicked`, and `restricted` are read
//!   as moderation having already flagged the identity.
//! - **Join recency**: members who joined within the configured delay window
//!   may not request creations yet.
//!
//! Join timestamps live in memory only. A restart inside the window loses
//! them, which relaxes protection briefly but never tightens it — acceptable
//! because the window is short.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use signupd_types::{ChatId, Requester, RequesterId, Result, error::ConfigSnafu};
use snafu::OptionExt;

use crate::chat::ChatApi;

/// Evaluates whether a requester is currently eligible to request a
/// creation.
#[derive(Debug)]
pub struct AntiAbuseGuard {
    reference_chat: Option<ChatId>,
    min_delay: Duration,
    joins: Mutex<HashMap<RequesterId, Instant>>,
}

impl AntiAbuseGuard {
    /// Creates a guard checking standing against `reference_chat` and
    /// requiring `min_delay` of membership.
    #[must_use]
    pub fn new(reference_chat: Option<ChatId>, min_delay: Duration) -> Self {
        Self { reference_chat, min_delay, joins: Mutex::new(HashMap::new()) }
    }

    /// Records a member-joined event. Automated agents are not tracked.
    pub fn record_join(&self, requester: &Requester) {
        if requester.is_automated {
            return;
        }
        self.joins.lock().insert(requester.id, Instant::now());
    }

    /// Whether `requester` passes both anti-abuse checks.
    ///
    /// No record in the join map means either pre-existing membership or a
    /// record that aged out of relevance; both count as eligible.
    ///
    /// # Errors
    ///
    /// Returns [`SignupError::Config`](signupd_types::SignupError) when no
    /// reference chat is configured — an operational fault, not a
    /// user-facing rejection reason.
    pub async fn is_eligible<C: ChatApi + ?Sized>(
        &self,
        chat: &C,
        requester: &Requester,
    ) -> Result<bool> {
        let reference = self.reference_chat.context(ConfigSnafu {
            message: "no reference chat configured for the standing check",
        })?;

        let status = chat.member_status(reference, requester.id).await?;
        if status.is_flagged() {
            tracing::info!(
                requester = %requester.id,
                name = %requester.display_name,
                ?status,
                "requester flagged by community standing"
            );
            return Ok(false);
        }

        if self.joined_too_recently(requester.id) {
            tracing::info!(
                requester = %requester.id,
                name = %requester.display_name,
                "requester joined too recently"
            );
            return Ok(false);
        }

        Ok(true)
    }

    fn joined_too_recently(&self, id: RequesterId) -> bool {
        self.joins.lock().get(&id).is_some_and(|joined| joined.elapsed() < self.min_delay)
    }

    /// Number of tracked joins, for monitoring.
    #[must_use]
    pub fn tracked_joins(&self) -> usize {
        self.joins.lock().len()
    }
}
