//! Error types for signupd using snafu.
//!
//! A single unified taxonomy covers every way a creation request can end
//! short of success:
//! - Request rejections (validation, eligibility, conflicts) — user-visible
//!   with a specific or deliberately generic message
//! - Operational faults (ledger, transport, persistence, configuration,
//!   allocator drift/exhaustion) — logged with full detail internally and
//!   reported to the user only as an opaque failure
//!
//! The split is carried by [`SignupError::is_operational`]; message rendering
//! lives with the chat-facing layer, not here.

use snafu::{Location, Snafu};

use crate::{
    types::{ChatId, RequesterId},
    validation::ValidationError,
};

/// Unified result type for signup operations.
pub type Result<T, E = SignupError> = std::result::Result<T, E>;

/// Top-level error type for the account-creation workflow.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SignupError {
    /// Request payload failed shape/charset/length validation.
    #[snafu(display("validation failed: {source}"))]
    Validation {
        /// The violated constraint.
        source: ValidationError,
    },

    /// Automated agents may not create accounts.
    #[snafu(display("requester is an automated agent"))]
    AutomatedAgent,

    /// The originating chat is not in the allow-list.
    #[snafu(display("{chat} is not in the allow-list"))]
    UnauthorizedChat {
        /// Where the request came from.
        chat: ChatId,
    },

    /// The anti-abuse guard rejected the requester.
    #[snafu(display("{requester} is not eligible for account creation"))]
    Ineligible {
        /// Who was rejected.
        requester: RequesterId,
    },

    /// Another creation transaction is already in flight.
    #[snafu(display("another account creation is in flight"))]
    Busy,

    /// The requester already completed a creation.
    #[snafu(display("{requester} already created an account"))]
    AlreadyCreated {
        /// Who repeated the request.
        requester: RequesterId,
    },

    /// A user-chosen target name is already registered.
    #[snafu(display("account name {name:?} is already registered"))]
    NameTaken {
        /// The taken name.
        name: String,
    },

    /// Derived-mode source account does not exist on the source network.
    #[snafu(display("source account {name:?} does not exist"))]
    SourceMissing {
        /// The missing source account.
        name: String,
    },

    /// Derived-mode source account exposes neither an owner nor an active key.
    #[snafu(display("source account {name:?} has no owner or active keys"))]
    SourceKeysMissing {
        /// The keyless source account.
        name: String,
    },

    /// An allocator candidate was already registered on the target network,
    /// meaning the persisted counter drifted behind actual usage.
    #[snafu(display("allocated candidate {candidate:?} is already registered; counter drifted"))]
    AllocationDrift {
        /// The colliding candidate name.
        candidate: String,
    },

    /// The premium namespace is used up; the counter must not wrap around.
    #[snafu(display("premium namespace exhausted at counter {counter}"))]
    Exhausted {
        /// Counter value at which exhaustion was detected.
        counter: u64,
    },

    /// The external ledger rejected or failed the transaction.
    #[snafu(display("ledger error at {location}: {message}"))]
    Ledger {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// The chat transport failed.
    #[snafu(display("chat transport error at {location}: {message}"))]
    Chat {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Durable state (blacklist, counter) could not be written.
    #[snafu(display("persistence fault at {location}: {message}"))]
    Persistence {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// The service is misconfigured.
    #[snafu(display("configuration error: {message}"))]
    Config {
        /// Error description.
        message: String,
    },
}

impl SignupError {
    /// Whether this error is an operational fault rather than a request
    /// rejection.
    ///
    /// Operational faults are logged with full detail and shown to the
    /// requester only as an opaque, non-diagnostic failure. Rejections carry
    /// a specific (or deliberately generic, for eligibility) user message
    /// and no internal detail.
    #[must_use]
    pub const fn is_operational(&self) -> bool {
        matches!(
            self,
            Self::AllocationDrift { .. }
                | Self::Exhausted { .. }
                | Self::Ledger { .. }
                | Self::Chat { .. }
                | Self::Persistence { .. }
                | Self::Config { .. }
        )
    }
}
