//! HTTP ledger client.
//!
//! Implements [`LedgerApi`] against two chain HTTP APIs (target network for
//! existence checks, source network for key lookups) and a signing service
//! that wraps, signs, and broadcasts submitted action bundles. Key custody
//! stays inside the signer; this process never sees a private key.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use signupd_types::{Result, error::LedgerSnafu};

use crate::{
    config::ChainConfig,
    ledger::{AccountKeys, Action, LedgerApi},
};

/// Transaction expiry, seconds past the reference block.
const EXPIRE_SECONDS: u32 = 30;

/// How far behind head the reference block is taken.
const BLOCKS_BEHIND: u32 = 3;

/// Ledger client over the chain HTTP APIs and the signing service.
#[derive(Debug)]
pub struct HttpLedger {
    client: reqwest::Client,
    target_api_url: String,
    source_api_url: String,
    signer_url: String,
}

/// The subset of a `get_account` response the key lookup needs.
#[derive(Debug, Deserialize)]
struct AccountInfo {
    #[serde(default)]
    permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize)]
struct Permission {
    perm_name: String,
    required_auth: RequiredAuth,
}

#[derive(Debug, Deserialize)]
struct RequiredAuth {
    #[serde(default)]
    keys: Vec<KeyWeight>,
}

#[derive(Debug, Deserialize)]
struct KeyWeight {
    key: String,
}

fn ledger_error(context: &str) -> impl FnOnce(reqwest::Error) -> signupd_types::SignupError + '_ {
    move |e| LedgerSnafu { message: format!("{context}: {e}") }.build()
}

impl HttpLedger {
    /// Creates a client for the configured endpoints.
    pub fn new(cfg: &ChainConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| LedgerSnafu { message: format!("http client: {e}") }.build())?;
        Ok(Self {
            client,
            target_api_url: cfg.target_api_url.clone(),
            source_api_url: cfg.source_api_url.clone(),
            signer_url: cfg.signer_url.clone(),
        })
    }

    /// `get_account` against `api`; `Ok(None)` when the chain reports the
    /// account unknown.
    ///
    /// Chain APIs signal an unknown account with an error status rather
    /// than an empty body, so any non-success response reads as absent.
    async fn get_account(&self, api: &str, name: &str) -> Result<Option<AccountInfo>> {
        let response = self
            .client
            .post(format!("{api}/v1/chain/get_account"))
            .json(&json!({ "account_name": name }))
            .send()
            .await
            .map_err(ledger_error("get_account"))?;

        if !response.status().is_success() {
            return Ok(None);
        }
        let info = response.json().await.map_err(ledger_error("get_account decode"))?;
        Ok(Some(info))
    }
}

fn first_key(info: &AccountInfo, permission: &str) -> Option<String> {
    info.permissions
        .iter()
        .find(|p| p.perm_name == permission)
        .and_then(|p| p.required_auth.keys.first())
        .map(|k| k.key.clone())
}

#[async_trait]
impl LedgerApi for HttpLedger {
    async fn account_exists(&self, name: &str) -> Result<bool> {
        Ok(self.get_account(&self.target_api_url, name).await?.is_some())
    }

    async fn account_keys(&self, name: &str) -> Result<Option<AccountKeys>> {
        let Some(info) = self.get_account(&self.source_api_url, name).await? else {
            return Ok(None);
        };
        Ok(Some(AccountKeys {
            owner: first_key(&info, "owner"),
            active: first_key(&info, "active"),
        }))
    }

    async fn submit(&self, actions: Vec<Action>) -> Result<()> {
        let response = self
            .client
            .post(&self.signer_url)
            .json(&json!({
                "actions": actions,
                "expire_seconds": EXPIRE_SECONDS,
                "blocks_behind": BLOCKS_BEHIND,
            }))
            .send()
            .await
            .map_err(ledger_error("submit"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return LedgerSnafu { message: format!("signer rejected transaction ({status}): {body}") }
                .fail();
        }
        Ok(())
    }
}
