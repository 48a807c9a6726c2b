//! The account-creation workflow.
//!
//! Carries a single chat request from receipt to a terminal outcome:
//!
//! 1. Reject automated agents
//! 2. Reject chats outside the allow-list (empty allow-list allows any)
//! 3. Mode-specific validation (direct: name/key shape and availability;
//!    derived: source keys and allocator candidate)
//! 4. Anti-abuse eligibility
//! 5. Single-flight gate — busy rejection if a creation is in flight
//! 6. Blacklist membership — already-created rejection
//! 7. Submit the transaction, persist the blacklist entry, advance the
//!    counter for consumed candidates
//!
//! The order is a contract: the first failing check determines the reported
//! reason and later checks are not evaluated. Invalid input is rejected
//! before any network call is made.
//!
//! Blacklist and counter are only mutated inside the gate's critical
//! section (with one deliberate exception: the drift advance of step 3,
//! which consumes a candidate the network already disproved). The gate
//! permit is an RAII guard, so the gate is released on every exit path.

use std::sync::Arc;

use signupd_store::BlacklistStore;
use signupd_types::{
    AccountName, ChatId, Created, CreationRequest, RequestKind, Result,
    error::{
        AllocationDriftSnafu, AlreadyCreatedSnafu, AutomatedAgentSnafu, BusySnafu,
        IneligibleSnafu, NameTakenSnafu, SourceKeysMissingSnafu, SourceMissingSnafu,
        UnauthorizedChatSnafu, ValidationSnafu,
    },
    validation,
};
use snafu::{OptionExt, ResultExt, ensure};

use crate::{
    allocator::PremiumNameAllocator,
    chat::ChatApi,
    config::ChainConfig,
    gate::CreationGate,
    guard::AntiAbuseGuard,
    ledger::{Action, LedgerApi, direct_creation_actions, premium_creation_actions},
};

/// A validated request ready for submission.
struct Prepared {
    name: AccountName,
    actions: Vec<Action>,
    /// Whether the name came out of the allocator and consumes the counter.
    consumed_candidate: bool,
}

/// Orchestrates validation, anti-abuse, single-flight, the ledger
/// transaction, and persistence for creation requests.
pub struct AccountCreationWorkflow<C, L> {
    chat: Arc<C>,
    ledger: Arc<L>,
    guard: Arc<AntiAbuseGuard>,
    gate: CreationGate,
    blacklist: BlacklistStore,
    allocator: PremiumNameAllocator,
    allowed_chats: Vec<ChatId>,
    chain: ChainConfig,
}

impl<C: ChatApi, L: LedgerApi> AccountCreationWorkflow<C, L> {
    /// Wires the workflow from its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chat: Arc<C>,
        ledger: Arc<L>,
        guard: Arc<AntiAbuseGuard>,
        gate: CreationGate,
        blacklist: BlacklistStore,
        allocator: PremiumNameAllocator,
        allowed_chats: Vec<ChatId>,
        chain: ChainConfig,
    ) -> Self {
        Self { chat, ledger, guard, gate, blacklist, allocator, allowed_chats, chain }
    }

    /// Handles one creation request to its terminal outcome.
    ///
    /// # Errors
    ///
    /// Every non-success outcome is a [`SignupError`](signupd_types::SignupError)
    /// variant; see the module docs for the evaluation order.
    pub async fn handle(&self, request: CreationRequest) -> Result<Created> {
        let requester = &request.requester;
        let mode = request.kind.mode();
        tracing::debug!(
            requester = %requester.id,
            name = %requester.display_name,
            chat = %request.origin_chat,
            %mode,
            "handling creation request"
        );

        ensure!(!requester.is_automated, AutomatedAgentSnafu);
        ensure!(
            self.allowed_chats.is_empty() || self.allowed_chats.contains(&request.origin_chat),
            UnauthorizedChatSnafu { chat: request.origin_chat }
        );

        let prepared = match &request.kind {
            RequestKind::Direct { name, public_key } => {
                self.prepare_direct(name, public_key).await?
            },
            RequestKind::Derived { source } => self.prepare_derived(source).await?,
        };

        let eligible = self.guard.is_eligible(self.chat.as_ref(), requester).await?;
        ensure!(eligible, IneligibleSnafu { requester: requester.id });

        // Held until return; drop releases the gate on every path.
        let _permit = self.gate.try_acquire().context(BusySnafu)?;

        ensure!(
            !self.blacklist.contains(requester.id),
            AlreadyCreatedSnafu { requester: requester.id }
        );

        self.notify_progress(request.origin_chat).await;

        self.ledger.submit(prepared.actions).await.inspect_err(|e| {
            tracing::error!(account = %prepared.name, error = %e, "ledger submit failed");
        })?;

        if prepared.consumed_candidate {
            self.allocator.advance();
        }
        // Persist the de-duplication entry before success is reported. A
        // write failure degrades duplicate protection but must not fail a
        // creation the ledger already accepted.
        if let Err(e) = self.blacklist.add(requester.id) {
            tracing::error!(requester = %requester.id, error = %e, "failed to persist blacklist entry");
        }

        tracing::info!(
            requester = %requester.id,
            name = %requester.display_name,
            account = %prepared.name,
            %mode,
            "account created"
        );
        Ok(Created { account_name: prepared.name, mode })
    }

    /// Direct mode: shape checks, then availability, then key structure.
    async fn prepare_direct(&self, name: &str, public_key: &str) -> Result<Prepared> {
        let name = validation::validate_target_name(name).context(ValidationSnafu)?;
        validation::require_present("public_key", public_key).context(ValidationSnafu)?;

        let taken = self.ledger.account_exists(name.as_str()).await?;
        ensure!(!taken, NameTakenSnafu { name: name.as_str() });

        validation::validate_public_key(public_key).context(ValidationSnafu)?;

        let actions = direct_creation_actions(&self.chain, &name, public_key);
        Ok(Prepared { name, actions, consumed_candidate: false })
    }

    /// Derived mode: source keys, then an allocator candidate.
    ///
    /// A candidate that is already registered means the counter drifted
    /// behind the network's actual usage: advance it exactly once and
    /// report a generic failure rather than silently retrying with the
    /// next candidate.
    async fn prepare_derived(&self, source: &str) -> Result<Prepared> {
        validation::validate_source_name(source).context(ValidationSnafu)?;

        let keys = self
            .ledger
            .account_keys(source)
            .await?
            .context(SourceMissingSnafu { name: source })?;
        let (owner_key, active_key) =
            keys.resolved().context(SourceKeysMissingSnafu { name: source })?;

        let candidate = self.allocator.next()?;
        if self.ledger.account_exists(candidate.as_str()).await? {
            tracing::warn!(
                candidate = %candidate,
                counter = self.allocator.counter(),
                "premium candidate already registered, advancing counter"
            );
            self.allocator.advance();
            return AllocationDriftSnafu { candidate: candidate.as_str() }.fail();
        }

        let actions = premium_creation_actions(&self.chain, &candidate, &owner_key, &active_key);
        Ok(Prepared { name: candidate, actions, consumed_candidate: true })
    }

    /// Best-effort progress notice; a transport hiccup must not abort a
    /// creation that already passed every check.
    async fn notify_progress(&self, chat: ChatId) {
        if let Err(e) = self.chat.send_message(chat, "Account creation in progress... \u{23f3}").await
        {
            tracing::warn!(chat = %chat, error = %e, "failed to send progress notice");
        }
    }

    /// The single-flight gate, for sharing with monitoring or tests.
    #[must_use]
    pub fn gate(&self) -> &CreationGate {
        &self.gate
    }
}
