//! Telegram Bot API binding.
//!
//! Thin HTTP layer over the bot API: long-polls `getUpdates`, converts raw
//! updates into [`Event`]s, and implements [`ChatApi`] over `sendMessage`
//! and `getChatMember`. Everything above this module is transport-agnostic.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use signupd_types::{
    ChatId, MembershipStatus, Requester, RequesterId, Result,
    error::{ChatSnafu, SignupError},
};

use crate::{
    chat::{ChatApi, Event, parse_command},
    config::TelegramConfig,
};

const API_BASE: &str = "https://api.telegram.org";

/// Telegram transport: long-polling client plus [`ChatApi`] implementation.
#[derive(Debug)]
pub struct TelegramChat {
    client: reqwest::Client,
    base_url: String,
    poll_timeout_secs: u64,
}

/// Envelope every bot API response is wrapped in.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiEnvelope<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if self.ok {
            if let Some(result) = self.result {
                return Ok(result);
            }
        }
        let description = self.description.unwrap_or_else(|| "no description".to_string());
        ChatSnafu { message: format!("{method} failed: {description}") }.fail()
    }
}

/// One entry from `getUpdates`.
#[derive(Debug, Deserialize)]
pub struct Update {
    /// Monotonic update identifier, used as the polling offset.
    pub update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    from: Option<User>,
    text: Option<String>,
    #[serde(default)]
    new_chat_members: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
    #[serde(default)]
    is_bot: bool,
    first_name: String,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    status: MembershipStatus,
}

fn requester_from(user: &User) -> Requester {
    let display_name = user.username.clone().unwrap_or_else(|| user.first_name.clone());
    Requester { id: RequesterId::new(user.id), display_name, is_automated: user.is_bot }
}

fn transport_error(method: &str) -> impl FnOnce(reqwest::Error) -> SignupError + '_ {
    move |e| ChatSnafu { message: format!("{method}: {e}") }.build()
}

impl TelegramChat {
    /// Creates a client for the configured bot token.
    pub fn new(cfg: &TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.poll_timeout_secs + 10))
            .build()
            .map_err(|e| ChatSnafu { message: format!("http client: {e}") }.build())?;
        Ok(Self {
            client,
            base_url: format!("{API_BASE}/bot{}", cfg.token),
            poll_timeout_secs: cfg.poll_timeout_secs,
        })
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(transport_error(method))?;
        let envelope: ApiEnvelope<T> =
            response.json().await.map_err(transport_error(method))?;
        envelope.into_result(method)
    }

    /// Long-polls for the next batch of updates after `offset`.
    ///
    /// Blocks server-side for up to the configured poll timeout when no
    /// updates are pending.
    ///
    /// # Errors
    ///
    /// Returns [`SignupError::Chat`] on transport or API failure; the poll
    /// loop logs and retries.
    pub async fn updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": self.poll_timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    /// Converts one raw update into zero or more events.
    ///
    /// A message announcing joined members yields one `MemberJoined` per
    /// member. Messages without a sender (channel posts) are dropped.
    #[must_use]
    pub fn events_from(update: &Update) -> Vec<Event> {
        let Some(message) = &update.message else { return Vec::new() };
        let chat = ChatId::new(message.chat.id);

        if !message.new_chat_members.is_empty() {
            return message
                .new_chat_members
                .iter()
                .map(|user| Event::MemberJoined { chat, requester: requester_from(user) })
                .collect();
        }

        let Some(from) = &message.from else { return Vec::new() };
        let Some(text) = &message.text else { return Vec::new() };
        let requester = requester_from(from);

        match parse_command(text) {
            Some(command) => vec![Event::Command { chat, requester, command }],
            None => vec![Event::Text { chat, requester, text: text.clone() }],
        }
    }
}

#[async_trait]
impl ChatApi for TelegramChat {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", json!({ "chat_id": chat.value(), "text": text }))
            .await?;
        Ok(())
    }

    async fn member_status(
        &self,
        chat: ChatId,
        requester: RequesterId,
    ) -> Result<MembershipStatus> {
        let member: ChatMember = self
            .call(
                "getChatMember",
                json!({ "chat_id": chat.value(), "user_id": requester.value() }),
            )
            .await?;
        Ok(member.status)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::chat::Command;

    fn parse_update(raw: serde_json::Value) -> Update {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_command_update_becomes_command_event() {
        let update = parse_update(json!({
            "update_id": 7,
            "message": {
                "chat": { "id": -100 },
                "from": { "id": 42, "is_bot": false, "first_name": "Ada", "username": "ada" },
                "text": "/chat_id",
            },
        }));

        let events = TelegramChat::events_from(&update);
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::Command { chat, requester, command } => {
                assert_eq!(*chat, ChatId::new(-100));
                assert_eq!(requester.id, RequesterId::new(42));
                assert_eq!(requester.display_name, "ada");
                assert!(!requester.is_automated);
                assert_eq!(*command, Command::ChatId);
            },
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_joined_members_become_join_events() {
        let update = parse_update(json!({
            "update_id": 8,
            "message": {
                "chat": { "id": -100 },
                "from": { "id": 1, "first_name": "Admin" },
                "new_chat_members": [
                    { "id": 2, "first_name": "Bob" },
                    { "id": 3, "first_name": "Eve", "is_bot": true },
                ],
            },
        }));

        let events = TelegramChat::events_from(&update);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Event::MemberJoined { requester, .. }
            if requester.id == RequesterId::new(2) && !requester.is_automated));
        assert!(matches!(&events[1], Event::MemberJoined { requester, .. }
            if requester.is_automated));
    }

    #[test]
    fn test_plain_text_becomes_text_event() {
        let update = parse_update(json!({
            "update_id": 9,
            "message": {
                "chat": { "id": 5 },
                "from": { "id": 6, "first_name": "Cy" },
                "text": "hello",
            },
        }));

        let events = TelegramChat::events_from(&update);
        assert!(matches!(&events[0], Event::Text { text, .. } if text == "hello"));
    }

    #[test]
    fn test_update_without_message_yields_nothing() {
        let update = parse_update(json!({ "update_id": 10 }));
        assert!(TelegramChat::events_from(&update).is_empty());
    }

    #[test]
    fn test_envelope_failure_maps_to_chat_error() {
        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_value(json!({
            "ok": false,
            "description": "Bad Request: chat not found",
        }))
        .unwrap();

        let err = envelope.into_result("sendMessage").unwrap_err();
        assert!(matches!(err, SignupError::Chat { .. }));
        assert!(err.to_string().contains("chat not found"));
    }

    #[test]
    fn test_display_name_falls_back_to_first_name() {
        let user = User { id: 1, is_bot: false, first_name: "Grace".into(), username: None };
        assert_eq!(requester_from(&user).display_name, "Grace");
    }
}
