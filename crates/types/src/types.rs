//! Core type definitions for signupd.
//!
//! Identifier newtypes for requesters and chats, the creation-request model,
//! and chat membership statuses as reported by the messaging transport.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a numeric type for type-safe identifiers.
///
/// Each generated type provides:
/// - Standard derives: Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord
/// - Serde with `#[serde(transparent)]` for wire format compatibility
/// - `From<inner>` and `Into<inner>` conversions
/// - `Display` with a semantic prefix (e.g., `req:123`)
/// - `new()` constructor and `value()` accessor
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $inner:ty, $prefix:expr
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Creates a new identifier from a raw value.
            #[inline]
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Returns the raw numeric value.
            #[inline]
            pub const fn value(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            #[inline]
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $inner {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = <$inner as std::str::FromStr>::Err;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.parse::<$inner>().map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier of a chat user requesting an account.
    ///
    /// Wraps the transport's numeric user id with compile-time type safety to
    /// prevent mixing with chat identifiers. Used as the de-duplication key in
    /// the blacklist.
    ///
    /// # Display
    ///
    /// Formats with `req:` prefix: `req:12345678`.
    RequesterId, i64, "req"
);

define_id!(
    /// Unique identifier of a chat (group or private).
    ///
    /// Group chat ids are negative on the wire; the newtype keeps the raw
    /// value untouched.
    ///
    /// # Display
    ///
    /// Formats with `chat:` prefix: `chat:-100123`.
    ChatId, i64, "chat"
);

/// The chat identity attempting to claim an account.
///
/// Immutable once a request has been received; `id` is the de-duplication key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    /// Transport-level user id.
    pub id: RequesterId,
    /// Human-readable name for logs and operator messages.
    pub display_name: String,
    /// Whether the transport flags this identity as an automated agent (bot).
    pub is_automated: bool,
}

/// A blockchain account name, target- or source-network.
///
/// Construction does not validate; validated names come out of
/// [`crate::validation`] or the premium-name allocator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountName(String);

impl AccountName {
    /// Wraps a raw string as an account name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which creation flow a request takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestMode {
    /// User supplied the account name and public key explicitly.
    Direct,
    /// Keys are copied from an existing source-network account onto an
    /// allocator-generated premium name.
    Derived,
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestMode::Direct => f.write_str("direct"),
            RequestMode::Derived => f.write_str("derived"),
        }
    }
}

/// Mode-specific payload of a creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Explicit `(account name, public key)` pair typed by the user.
    Direct {
        /// Desired 12-character target-network name.
        name: String,
        /// Public key for both owner and active permissions.
        public_key: String,
    },
    /// Source-network account whose owner/active keys are copied.
    Derived {
        /// Existing source-network account name.
        source: String,
    },
}

impl RequestKind {
    /// Returns the mode label of this payload.
    #[must_use]
    pub fn mode(&self) -> RequestMode {
        match self {
            RequestKind::Direct { .. } => RequestMode::Direct,
            RequestKind::Derived { .. } => RequestMode::Derived,
        }
    }
}

/// A single account-creation request as received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationRequest {
    /// Who is asking.
    pub requester: Requester,
    /// Chat the request arrived in; checked against the allow-list.
    pub origin_chat: ChatId,
    /// Mode-specific payload.
    pub kind: RequestKind,
}

/// Terminal success outcome of a creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    /// Final name of the account on the target network.
    pub account_name: AccountName,
    /// Which flow produced it.
    pub mode: RequestMode,
}

/// A user's membership status in a chat, as reported by the transport.
///
/// `left`, `kicked`, and `restricted` are treated as signals that the
/// community's moderation has already flagged the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    /// Chat owner.
    Creator,
    /// Chat administrator.
    Administrator,
    /// Regular member.
    Member,
    /// Member with restrictions applied by moderation.
    Restricted,
    /// Not currently in the chat.
    Left,
    /// Banned from the chat.
    Kicked,
}

impl MembershipStatus {
    /// Whether this status marks the identity as flagged by moderation.
    #[must_use]
    pub const fn is_flagged(self) -> bool {
        matches!(self, MembershipStatus::Left | MembershipStatus::Kicked | MembershipStatus::Restricted)
    }
}
