//! Chat transport capability and inbound event model.
//!
//! The messaging system is an external collaborator: the workflow only needs
//! to deliver text to a chat and query a user's membership status. Inbound
//! traffic arrives as [`Event`]s produced by a transport binding (see
//! [`crate::telegram`]) or handed in directly by tests.

use async_trait::async_trait;
use signupd_types::{ChatId, MembershipStatus, Requester, RequesterId, Result};

/// Messaging capability consumed by the workflow and the bot.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Delivers a text message to a chat.
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<()>;

    /// Queries a user's membership status in a chat.
    async fn member_status(&self, chat: ChatId, requester: RequesterId)
    -> Result<MembershipStatus>;
}

/// An inbound event from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A recognized command message.
    Command {
        /// Chat the command was issued in.
        chat: ChatId,
        /// Who issued it.
        requester: Requester,
        /// The parsed command.
        command: Command,
    },
    /// A new member joined a chat.
    MemberJoined {
        /// Chat that was joined.
        chat: ChatId,
        /// The joining member.
        requester: Requester,
    },
    /// Plain text that is not a recognized command.
    Text {
        /// Chat the message was sent in.
        chat: ChatId,
        /// Who sent it.
        requester: Requester,
        /// Message body.
        text: String,
    },
}

/// User-facing command surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/new_account <name> <publickey>` — direct mode.
    ///
    /// Missing arguments arrive as empty strings and are rejected by
    /// validation, which owns the error message.
    NewAccount {
        /// Desired target-network name, lowercased.
        name: String,
        /// Public key for both permissions.
        public_key: String,
    },
    /// `/easy_account <source-name>` — derived mode.
    EasyAccount {
        /// Source-network account, lowercased.
        source: String,
    },
    /// `/chat_id` — reply with the chat identifier.
    ChatId,
    /// `/help` or `/start` — usage text.
    Help,
}

/// Parses a message body into a command.
///
/// Returns `None` for plain text and unknown commands. A `@botname`
/// mention suffix on the command word is stripped.
#[must_use]
pub fn parse_command(text: &str) -> Option<Command> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?.strip_prefix('/')?;
    let head = head.split('@').next().unwrap_or(head);

    match head {
        "new_account" => {
            let name = parts.next().unwrap_or_default().to_lowercase();
            let public_key = parts.next().unwrap_or_default().to_string();
            Some(Command::NewAccount { name, public_key })
        },
        "easy_account" => {
            let source = parts.next().unwrap_or_default().to_lowercase();
            Some(Command::EasyAccount { source })
        },
        "chat_id" | "groupid" => Some(Command::ChatId),
        "help" | "start" => Some(Command::Help),
        _ => None,
    }
}
