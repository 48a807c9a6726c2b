//! Event dispatch and reply rendering.
//!
//! The bot sits between the transport and the workflow: it routes inbound
//! [`Event`]s, applies the development-mode command filter, runs creation
//! requests through the workflow, and turns every outcome into a chat
//! reply. Operational faults get a generic apology; the precise cause goes
//! to the log, never to the chat.

use std::sync::Arc;

use signupd_types::{
    ChatId, Created, CreationRequest, RequestKind, RequestMode, Requester, RequesterId,
    SignupError,
};

use crate::{
    chat::{ChatApi, Command, Event},
    config::ChainConfig,
    guard::AntiAbuseGuard,
    ledger::LedgerApi,
    workflow::AccountCreationWorkflow,
};

const HELP_TEXT: &str = "\
Hi! I create blockchain accounts.\n\
\n\
/new_account <name> <publickey> — create an account with a name you choose \
(12 characters, a-z and 1-5) and your own public key\n\
/easy_account <account> — create a premium account reusing the keys of an \
account you already own on the source network\n\
/chat_id — show this chat's identifier\n\
/help — this message";

/// Routes transport events to the workflow and renders replies.
pub struct Bot<C, L> {
    chat: Arc<C>,
    workflow: AccountCreationWorkflow<C, L>,
    guard: Arc<AntiAbuseGuard>,
    chain: ChainConfig,
    production: bool,
    developer_id: Option<RequesterId>,
}

impl<C: ChatApi, L: LedgerApi> Bot<C, L> {
    /// Wires the bot to its workflow and collaborators.
    pub fn new(
        chat: Arc<C>,
        workflow: AccountCreationWorkflow<C, L>,
        guard: Arc<AntiAbuseGuard>,
        chain: ChainConfig,
        production: bool,
        developer_id: Option<RequesterId>,
    ) -> Self {
        Self { chat, workflow, guard, chain, production, developer_id }
    }

    /// Handles one inbound event to completion.
    ///
    /// Never returns an error: every failure is rendered into a reply or
    /// logged. The poll loop stays alive regardless of outcomes.
    pub async fn handle_event(&self, event: Event) {
        match event {
            Event::MemberJoined { chat, requester } => {
                tracing::debug!(chat = %chat, requester = %requester.id, "member joined");
                self.guard.record_join(&requester);
            },
            Event::Text { chat, requester, text } => {
                tracing::debug!(chat = %chat, requester = %requester.id, %text, "ignoring plain text");
            },
            Event::Command { chat, requester, command } => {
                self.handle_command(chat, requester, command).await;
            },
        }
    }

    async fn handle_command(&self, chat: ChatId, requester: Requester, command: Command) {
        // Other bots get no replies at all, not even help.
        if requester.is_automated {
            tracing::debug!(requester = %requester.id, "dropping command from automated agent");
            return;
        }
        if !self.allowed_by_dev_filter(&requester) {
            tracing::debug!(requester = %requester.id, "dropping command in development mode");
            return;
        }

        let reply = match command {
            Command::Help => HELP_TEXT.to_string(),
            Command::ChatId => format!("Chat id: {}", chat.value()),
            Command::NewAccount { name, public_key } => {
                let request = CreationRequest {
                    requester,
                    origin_chat: chat,
                    kind: RequestKind::Direct { name, public_key },
                };
                self.run_creation(request).await
            },
            Command::EasyAccount { source } => {
                let request = CreationRequest {
                    requester,
                    origin_chat: chat,
                    kind: RequestKind::Derived { source },
                };
                self.run_creation(request).await
            },
        };

        if let Err(e) = self.chat.send_message(chat, &reply).await {
            tracing::error!(chat = %chat, error = %e, "failed to send reply");
        }
    }

    /// Outside production mode only the developer may issue commands.
    fn allowed_by_dev_filter(&self, requester: &Requester) -> bool {
        self.production || self.developer_id == Some(requester.id)
    }

    async fn run_creation(&self, request: CreationRequest) -> String {
        match self.workflow.handle(request).await {
            Ok(created) => self.success_text(&created),
            Err(e) => {
                if e.is_operational() {
                    tracing::error!(error = %e, "creation failed operationally");
                }
                rejection_text(&e)
            },
        }
    }

    fn success_text(&self, created: &Created) -> String {
        let mut text = format!("\u{1f389} Account {} created successfully!", created.account_name);
        if created.mode == RequestMode::Direct {
            text.push_str(
                "\nMake sure to safely store the private key belonging to the public key you \
                 provided. It is the only way to access your new account.",
            );
        }
        if self.chain.post_account_link {
            if let Some(explorer) = &self.chain.explorer_url {
                text.push_str(&format!("\n{explorer}{}", created.account_name));
            }
        }
        text
    }
}

/// The user-facing reply for a failed creation.
///
/// Operational faults all collapse into the same generic apology.
fn rejection_text(error: &SignupError) -> String {
    match error {
        SignupError::Validation { source } => {
            format!("\u{274c} That request is invalid: {source}.")
        },
        SignupError::AutomatedAgent => "Sorry, bots cannot request accounts.".to_string(),
        SignupError::UnauthorizedChat { .. } => {
            "This command is not available in this chat.".to_string()
        },
        SignupError::Ineligible { .. } => {
            "\u{1f614} Sorry, you are not eligible for a free account yet. Stick around and try again later."
                .to_string()
        },
        SignupError::Busy => {
            "Another account creation is already in progress. Please try again in a moment. \u{23f3}"
                .to_string()
        },
        SignupError::AlreadyCreated { .. } => {
            "You have already received an account. Only one per person. \u{1f609}".to_string()
        },
        SignupError::NameTaken { name } => {
            format!("The name {name} is already taken. Please pick another one.")
        },
        SignupError::SourceMissing { name } => {
            format!("Could not find the account {name} on the source network.")
        },
        SignupError::SourceKeysMissing { name } => {
            format!("The account {name} has no usable keys to copy.")
        },
        _ => "Something went wrong on our side. Please try again later. \u{1f64f}".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use signupd_store::{BlacklistStore, CounterStore};
    use signupd_test_utils::TestDir;
    use signupd_types::error::LedgerSnafu;

    use super::*;
    use crate::{
        allocator::PremiumNameAllocator,
        gate::CreationGate,
        mock::{MockChat, MockLedger},
    };

    // 50 base58 characters for building syntactically valid legacy keys.
    const KEY_BODY: &str = "6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";

    fn build_bot(
        production: bool,
        developer_id: Option<i64>,
    ) -> (Arc<MockChat>, Arc<MockLedger>, Bot<MockChat, MockLedger>, TestDir) {
        let dir = TestDir::new();
        let chat = Arc::new(MockChat::new());
        let ledger = Arc::new(MockLedger::new());
        let guard =
            Arc::new(AntiAbuseGuard::new(Some(ChatId::new(-1000)), Duration::from_secs(600)));
        let chain = ChainConfig::for_test();
        let workflow = AccountCreationWorkflow::new(
            Arc::clone(&chat),
            Arc::clone(&ledger),
            Arc::clone(&guard),
            CreationGate::new(),
            BlacklistStore::open(dir.join("blacklist.json")),
            PremiumNameAllocator::new(
                CounterStore::open(dir.join("counter.json")),
                &chain.premium_suffix,
            ),
            vec![],
            chain.clone(),
        );
        let bot = Bot::new(chat.clone(), workflow, guard, chain, production, developer_id.map(RequesterId::new));
        (chat, ledger, bot, dir)
    }

    fn requester(id: i64) -> Requester {
        Requester { id: RequesterId::new(id), display_name: format!("user{id}"), is_automated: false }
    }

    #[tokio::test]
    async fn test_help_command_replies_with_usage() {
        let (chat, _ledger, bot, _dir) = build_bot(true, None);
        bot.handle_event(Event::Command {
            chat: ChatId::new(5),
            requester: requester(1),
            command: Command::Help,
        })
        .await;

        let sent = chat.messages_to(ChatId::new(5));
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("/new_account"));
        assert!(sent[0].contains("/easy_account"));
    }

    #[tokio::test]
    async fn test_chat_id_command_replies_with_identifier() {
        let (chat, _ledger, bot, _dir) = build_bot(true, None);
        bot.handle_event(Event::Command {
            chat: ChatId::new(-100123),
            requester: requester(1),
            command: Command::ChatId,
        })
        .await;

        assert_eq!(chat.messages_to(ChatId::new(-100123)), vec!["Chat id: -100123".to_string()]);
    }

    #[tokio::test]
    async fn test_dev_filter_drops_non_developer_commands() {
        let (chat, _ledger, bot, _dir) = build_bot(false, Some(99));
        bot.handle_event(Event::Command {
            chat: ChatId::new(5),
            requester: requester(1),
            command: Command::Help,
        })
        .await;
        assert_eq!(chat.send_count(), 0);

        bot.handle_event(Event::Command {
            chat: ChatId::new(5),
            requester: requester(99),
            command: Command::Help,
        })
        .await;
        assert_eq!(chat.send_count(), 1);
    }

    #[tokio::test]
    async fn test_automated_agents_get_no_replies_at_all() {
        let (chat, _ledger, bot, _dir) = build_bot(true, None);
        let mut r = requester(1);
        r.is_automated = true;

        for command in [
            Command::Help,
            Command::ChatId,
            Command::NewAccount {
                name: "waxmeetup123".to_string(),
                public_key: format!("EOS{KEY_BODY}"),
            },
        ] {
            bot.handle_event(Event::Command {
                chat: ChatId::new(5),
                requester: r.clone(),
                command,
            })
            .await;
        }
        assert_eq!(chat.send_count(), 0);
    }

    #[tokio::test]
    async fn test_direct_creation_sends_one_success_reply_with_key_warning() {
        let (chat, _ledger, bot, _dir) = build_bot(true, None);
        bot.handle_event(Event::Command {
            chat: ChatId::new(5),
            requester: requester(1),
            command: Command::NewAccount {
                name: "waxmeetup123".to_string(),
                public_key: format!("EOS{KEY_BODY}"),
            },
        })
        .await;

        let sent = chat.messages_to(ChatId::new(5));
        let successes: Vec<&String> =
            sent.iter().filter(|m| m.contains("created successfully")).collect();
        assert_eq!(successes.len(), 1);
        assert!(successes[0].contains("waxmeetup123"));
        assert!(successes[0].contains("private key"));
    }

    #[tokio::test]
    async fn test_derived_creation_reply_has_no_key_warning() {
        let (chat, ledger, bot, _dir) = build_bot(true, None);
        ledger.set_source_account(
            "myeosname",
            crate::ledger::AccountKeys {
                owner: Some("EOSOWNERKEY".to_string()),
                active: Some("EOSACTIVEKEY".to_string()),
            },
        );

        bot.handle_event(Event::Command {
            chat: ChatId::new(5),
            requester: requester(1),
            command: Command::EasyAccount { source: "myeosname".to_string() },
        })
        .await;

        let sent = chat.messages_to(ChatId::new(5));
        let success = sent.iter().find(|m| m.contains("created successfully")).unwrap();
        assert!(success.contains("a11.phoenix"));
        assert!(!success.contains("private key"));
    }

    #[tokio::test]
    async fn test_plain_text_sends_nothing() {
        let (chat, _ledger, bot, _dir) = build_bot(true, None);
        bot.handle_event(Event::Text {
            chat: ChatId::new(5),
            requester: requester(1),
            text: "hello".to_string(),
        })
        .await;
        assert_eq!(chat.send_count(), 0);
    }

    #[test]
    fn test_operational_faults_render_generically() {
        let generic = rejection_text(&LedgerSnafu { message: "boom" }.build());
        assert!(!generic.contains("boom"));

        assert!(rejection_text(&SignupError::Busy).contains("in progress"));
    }

    #[test]
    fn test_validation_rejection_names_the_constraint() {
        let err = signupd_types::validation::validate_target_name("short").unwrap_err();
        let text = rejection_text(&SignupError::Validation { source: err });
        assert!(text.contains("name"));
    }
}
