//! Ledger capability and chain action payloads.
//!
//! The transaction-signing client is an external collaborator. The workflow
//! only needs three operations: an existence check on the target network, a
//! key lookup on the source network, and submission of a prepared action
//! bundle. Retry/backoff and the nonce/expiry window belong to the
//! implementation behind the trait, not to the workflow.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use signupd_types::{AccountName, Result};

use crate::config::ChainConfig;

/// RAM bought for every premium account creation, in bytes.
const PREMIUM_RAM_BYTES: u32 = 6144;

/// CPU stake delegated to every premium account.
const PREMIUM_CPU_STAKE: &str = "0.90000000 WAX";

/// NET stake delegated to every premium account.
const PREMIUM_NET_STAKE: &str = "0.10000000 WAX";

/// Ledger capability consumed by the workflow.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Whether `name` is registered on the target network.
    async fn account_exists(&self, name: &str) -> Result<bool>;

    /// Owner/active keys of `name` on the source network.
    ///
    /// Returns `None` if the account does not exist.
    async fn account_keys(&self, name: &str) -> Result<Option<AccountKeys>>;

    /// Submits a signed transaction carrying `actions`.
    async fn submit(&self, actions: Vec<Action>) -> Result<()>;
}

/// Owner/active permission keys of a source-network account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKeys {
    /// First key of the `owner` permission, if any.
    pub owner: Option<String>,
    /// First key of the `active` permission, if any.
    pub active: Option<String>,
}

impl AccountKeys {
    /// Resolves the `(owner, active)` pair, each falling back to the other's
    /// key when one is absent.
    ///
    /// Returns `None` when both are absent.
    #[must_use]
    pub fn resolved(&self) -> Option<(String, String)> {
        let owner = self.owner.clone().or_else(|| self.active.clone())?;
        let active = self.active.clone().unwrap_or_else(|| owner.clone());
        Some((owner, active))
    }
}

/// A single contract action within a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    /// Contract account.
    pub account: String,
    /// Action name on the contract.
    pub name: String,
    /// Authorizations the signer provides.
    pub authorization: Vec<Authorization>,
    /// Action-specific payload.
    pub data: serde_json::Value,
}

/// An actor/permission pair authorizing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authorization {
    /// Authorizing account.
    pub actor: String,
    /// Permission level.
    pub permission: String,
}

fn creator_auth(cfg: &ChainConfig) -> Vec<Authorization> {
    vec![Authorization {
        actor: cfg.creator_account.clone(),
        permission: cfg.creator_permission.clone(),
    }]
}

/// A single-key permission authority.
fn authority(key: &str) -> serde_json::Value {
    json!({
        "threshold": 1,
        "keys": [{ "key": key, "weight": 1 }],
        "accounts": [],
        "waits": [],
    })
}

/// Builds the direct-mode transaction: a token transfer to the signup
/// contract with `<name>-<publickey>` in the memo.
#[must_use]
pub fn direct_creation_actions(
    cfg: &ChainConfig,
    name: &AccountName,
    public_key: &str,
) -> Vec<Action> {
    vec![Action {
        account: "eosio.token".to_string(),
        name: "transfer".to_string(),
        authorization: creator_auth(cfg),
        data: json!({
            "from": cfg.creator_account,
            "to": cfg.signup_contract,
            "quantity": cfg.payment_quantity,
            "memo": format!("{name}-{public_key}"),
        }),
    }]
}

/// Builds the derived-mode transaction: `newaccount` with the copied keys,
/// plus RAM purchase and bandwidth stake so the account is usable.
#[must_use]
pub fn premium_creation_actions(
    cfg: &ChainConfig,
    name: &AccountName,
    owner_key: &str,
    active_key: &str,
) -> Vec<Action> {
    vec![
        Action {
            account: "eosio".to_string(),
            name: "newaccount".to_string(),
            authorization: creator_auth(cfg),
            data: json!({
                "creator": cfg.creator_account,
                "name": name.as_str(),
                "owner": authority(owner_key),
                "active": authority(active_key),
            }),
        },
        Action {
            account: "eosio".to_string(),
            name: "buyrambytes".to_string(),
            authorization: creator_auth(cfg),
            data: json!({
                "payer": cfg.creator_account,
                "receiver": name.as_str(),
                "bytes": PREMIUM_RAM_BYTES,
            }),
        },
        Action {
            account: "eosio".to_string(),
            name: "delegatebw".to_string(),
            authorization: creator_auth(cfg),
            data: json!({
                "from": cfg.creator_account,
                "receiver": name.as_str(),
                "stake_cpu_quantity": PREMIUM_CPU_STAKE,
                "stake_net_quantity": PREMIUM_NET_STAKE,
                "transfer": true,
            }),
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_falls_back_both_ways() {
        let both = AccountKeys { owner: Some("OWNER".into()), active: Some("ACTIVE".into()) };
        assert_eq!(both.resolved(), Some(("OWNER".to_string(), "ACTIVE".to_string())));

        let owner_only = AccountKeys { owner: Some("OWNER".into()), active: None };
        assert_eq!(owner_only.resolved(), Some(("OWNER".to_string(), "OWNER".to_string())));

        let active_only = AccountKeys { owner: None, active: Some("ACTIVE".into()) };
        assert_eq!(active_only.resolved(), Some(("ACTIVE".to_string(), "ACTIVE".to_string())));

        assert_eq!(AccountKeys::default().resolved(), None);
    }

    #[test]
    fn test_direct_actions_carry_name_and_key_in_memo() {
        let cfg = ChainConfig::for_test();
        let name = AccountName::new("waxmeetup123");
        let actions = direct_creation_actions(&cfg, &name, "EOStestkey");

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].account, "eosio.token");
        assert_eq!(actions[0].name, "transfer");
        assert_eq!(actions[0].data["memo"], "waxmeetup123-EOStestkey");
        assert_eq!(actions[0].data["to"], cfg.signup_contract);
        assert_eq!(actions[0].authorization[0].actor, cfg.creator_account);
    }

    #[test]
    fn test_premium_actions_bundle() {
        let cfg = ChainConfig::for_test();
        let name = AccountName::new("a11.phoenix");
        let actions = premium_creation_actions(&cfg, &name, "OWNERKEY", "ACTIVEKEY");

        let names: Vec<&str> = actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["newaccount", "buyrambytes", "delegatebw"]);

        assert_eq!(actions[0].data["name"], "a11.phoenix");
        assert_eq!(actions[0].data["owner"]["keys"][0]["key"], "OWNERKEY");
        assert_eq!(actions[0].data["active"]["keys"][0]["key"], "ACTIVEKEY");
        assert_eq!(actions[1].data["bytes"], 6144);
        assert_eq!(actions[2].data["transfer"], true);
    }
}
