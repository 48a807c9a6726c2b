//! Server configuration.
//!
//! Provides configuration loading from files and environment variables.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use signupd_types::{ChatId, SignupError};

/// Command-line interface for the `signupd` binary.
#[derive(Debug, Parser)]
#[command(name = "signupd", about = "Chat-driven blockchain account creation service")]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "SIGNUPD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the data directory from the config file.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Chat transport settings.
    pub telegram: TelegramConfig,
    /// Ledger/chain settings.
    pub chain: ChainConfig,
    /// Chats allowed to issue creation commands. Empty means any chat.
    #[serde(default)]
    pub allowed_chats: Vec<i64>,
    /// Reference chat for the community-standing check. Without it the
    /// anti-abuse guard treats every requester as ineligible.
    #[serde(default)]
    pub reference_chat: Option<i64>,
    /// Minimum seconds of community membership before a new member may
    /// request a creation.
    #[serde(default = "default_join_delay_secs")]
    pub join_delay_secs: u64,
    /// Data directory for the blacklist and premium counter files.
    pub data_dir: PathBuf,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Chat transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token.
    pub token: String,
    /// Long-poll timeout in seconds for update fetching.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// When false, only `developer_id` may issue commands (development mode).
    #[serde(default)]
    pub production: bool,
    /// Developer account allowed through the development-mode filter.
    #[serde(default)]
    pub developer_id: Option<i64>,
}

/// Ledger/chain configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// Target-network chain API endpoint (availability checks).
    pub target_api_url: String,
    /// Source-network chain API endpoint (derived-mode key lookups).
    pub source_api_url: String,
    /// Signing relay that accepts action bundles and submits them signed.
    pub signer_url: String,
    /// Account that pays for and authorizes creations.
    #[serde(default = "default_creator_account")]
    pub creator_account: String,
    /// Permission the creator signs with.
    #[serde(default = "default_creator_permission")]
    pub creator_permission: String,
    /// Signup contract receiving the direct-mode transfer.
    #[serde(default = "default_signup_contract")]
    pub signup_contract: String,
    /// Token quantity sent with the direct-mode transfer.
    #[serde(default = "default_payment_quantity")]
    pub payment_quantity: String,
    /// Suffix domain label appended to allocator-generated premium names.
    #[serde(default = "default_premium_suffix")]
    pub premium_suffix: String,
    /// Whether success messages embed an explorer link to the new account.
    #[serde(default = "default_post_account_link")]
    pub post_account_link: bool,
    /// Explorer URL prefix the account name is appended to.
    #[serde(default)]
    pub explorer_url: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON for non-TTY stdout, text otherwise.
    #[default]
    Auto,
    /// Human-readable format (development).
    Text,
    /// JSON structured logging (production).
    Json,
}

fn default_join_delay_secs() -> u64 {
    600 // 10 minutes of membership before creations are allowed
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_creator_account() -> String {
    "waxmeetupbot".to_string()
}

fn default_creator_permission() -> String {
    "active".to_string()
}

fn default_signup_contract() -> String {
    "signupwaxwax".to_string()
}

fn default_payment_quantity() -> String {
    "1.50000000 WAX".to_string()
}

fn default_premium_suffix() -> String {
    "phoenix".to_string()
}

fn default_post_account_link() -> bool {
    true
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Supports TOML format. Environment variables override config values
    /// using the `SIGNUPD__` prefix with `__` as the nesting separator
    /// (e.g., `SIGNUPD__TELEGRAM__TOKEN`, `SIGNUPD__CHAIN__SIGNER_URL`).
    ///
    /// # Errors
    ///
    /// Returns [`SignupError::Config`] if loading or deserializing fails.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, SignupError> {
        let builder = config::Config::builder();

        // Add config file if provided
        let builder = if let Some(path) = path {
            builder.add_source(config::File::from(path))
        } else {
            // Try default locations
            builder
                .add_source(config::File::with_name("signupd").required(false))
                .add_source(config::File::with_name("/etc/signupd/config").required(false))
        };

        let builder = builder.add_source(
            config::Environment::with_prefix("SIGNUPD").separator("__").try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| SignupError::Config { message: format!("failed to load config: {e}") })?;

        config
            .try_deserialize()
            .map_err(|e| SignupError::Config { message: format!("failed to parse config: {e}") })
    }

    /// Allowed chats as typed identifiers.
    #[must_use]
    pub fn allowed_chat_ids(&self) -> Vec<ChatId> {
        self.allowed_chats.iter().copied().map(ChatId::new).collect()
    }

    /// Reference chat as a typed identifier.
    #[must_use]
    pub fn reference_chat_id(&self) -> Option<ChatId> {
        self.reference_chat.map(ChatId::new)
    }

    /// Create a configuration for testing.
    #[allow(clippy::unwrap_used, dead_code)]
    pub fn for_test(data_dir: PathBuf) -> Self {
        Self {
            telegram: TelegramConfig {
                token: "test-token".to_string(),
                poll_timeout_secs: default_poll_timeout_secs(),
                production: true,
                developer_id: None,
            },
            chain: ChainConfig::for_test(),
            allowed_chats: vec![],
            reference_chat: Some(-1000),
            join_delay_secs: default_join_delay_secs(),
            data_dir,
            log_format: LogFormat::Text,
        }
    }
}

impl ChainConfig {
    /// Create a chain configuration for testing.
    #[allow(dead_code)]
    pub fn for_test() -> Self {
        Self {
            target_api_url: "http://127.0.0.1:8888".to_string(),
            source_api_url: "http://127.0.0.1:8889".to_string(),
            signer_url: "http://127.0.0.1:8900/sign".to_string(),
            creator_account: default_creator_account(),
            creator_permission: default_creator_permission(),
            signup_contract: default_signup_contract(),
            payment_quantity: default_payment_quantity(),
            premium_suffix: default_premium_suffix(),
            post_account_link: false,
            explorer_url: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(default_join_delay_secs(), 600);
        assert_eq!(default_payment_quantity(), "1.50000000 WAX");
        assert!(default_post_account_link());
        assert_eq!(LogFormat::default(), LogFormat::Auto);
    }

    #[test]
    fn test_config_for_test() {
        let config = Config::for_test(PathBuf::from("/tmp/signupd-test"));
        assert!(config.allowed_chat_ids().is_empty());
        assert_eq!(config.reference_chat_id(), Some(ChatId::new(-1000)));
        assert!(config.telegram.production);
    }

    #[test]
    fn test_log_format_wire_names() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
