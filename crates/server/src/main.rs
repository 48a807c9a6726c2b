//! signupd server binary.
//!
//! Launches the chat-driven account-creation service: loads configuration,
//! wires the workflow to the Telegram transport and the chain HTTP APIs,
//! then long-polls for updates until shutdown.
//!
//! # Usage
//!
//! ```bash
//! # Start with a config file
//! signupd --config /etc/signupd/config.toml
//!
//! # Environment variables override config values
//! SIGNUPD__TELEGRAM__TOKEN=123:abc \
//! SIGNUPD__CHAIN__SIGNER_URL=http://signer:8900/sign \
//! signupd
//! ```

use std::{io::IsTerminal, sync::Arc, time::Duration};

use clap::Parser;
use signupd_server::{
    AccountCreationWorkflow, AntiAbuseGuard, Bot, CreationGate, HttpLedger, PremiumNameAllocator,
    TelegramChat,
    config::{Cli, Config, LogFormat},
    shutdown::shutdown_signal,
};
use signupd_store::{BlacklistStore, CounterStore};
use signupd_types::{RequesterId, SignupError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Delay before retrying after a failed update poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), SignupError> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    init_logging(&config);

    tracing::info!(
        data_dir = %config.data_dir.display(),
        production = config.telegram.production,
        allowed_chats = config.allowed_chats.len(),
        "Starting signupd"
    );

    if config.reference_chat.is_none() {
        tracing::warn!(
            "No reference chat configured. Every creation request will fail the \
             eligibility check. Set reference_chat or SIGNUPD__REFERENCE_CHAT."
        );
    }
    if !config.telegram.production {
        tracing::warn!(
            developer_id = ?config.telegram.developer_id,
            "Running in development mode. Commands from other users are dropped."
        );
    }

    let telegram = Arc::new(TelegramChat::new(&config.telegram)?);
    let ledger = Arc::new(HttpLedger::new(&config.chain)?);
    let guard = Arc::new(AntiAbuseGuard::new(
        config.reference_chat_id(),
        Duration::from_secs(config.join_delay_secs),
    ));

    let blacklist = BlacklistStore::open(config.data_dir.join("blacklist.json"));
    let counter = CounterStore::open(config.data_dir.join("premium_counter.json"));
    let allocator = PremiumNameAllocator::new(counter, &config.chain.premium_suffix);

    let workflow = AccountCreationWorkflow::new(
        Arc::clone(&telegram),
        ledger,
        Arc::clone(&guard),
        CreationGate::new(),
        blacklist,
        allocator,
        config.allowed_chat_ids(),
        config.chain.clone(),
    );
    let bot = Bot::new(
        Arc::clone(&telegram),
        workflow,
        guard,
        config.chain.clone(),
        config.telegram.production,
        config.telegram.developer_id.map(RequesterId::new),
    );

    tokio::select! {
        () = poll_loop(&telegram, &bot) => {},
        () = shutdown_signal() => {},
    }

    tracing::info!("signupd stopped");
    Ok(())
}

/// Long-polls the transport and dispatches every event to the bot.
///
/// Poll failures are logged and retried after a short delay; the loop only
/// ends with the process.
async fn poll_loop(telegram: &TelegramChat, bot: &Bot<TelegramChat, HttpLedger>) {
    let mut offset = 0i64;
    loop {
        let updates = match telegram.updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(error = %e, "update poll failed, retrying");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            },
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            for event in TelegramChat::events_from(&update) {
                bot.handle_event(event).await;
            }
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = match config.log_format {
        LogFormat::Json => true,
        LogFormat::Text => false,
        LogFormat::Auto => !std::io::stdout().is_terminal(),
    };

    if use_json {
        // JSON format for production / log aggregation
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .init();
    } else {
        // Human-readable text format for development
        tracing_subscriber::registry().with(env_filter).with(fmt::layer()).init();
    }
}
