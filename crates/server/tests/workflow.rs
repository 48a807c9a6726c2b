//! End-to-end workflow tests over the mock transport and ledger.

#![allow(clippy::unwrap_used)]

use std::{sync::Arc, time::Duration};

use signupd_server::{
    AccountCreationWorkflow, AntiAbuseGuard, CreationGate, PremiumNameAllocator,
    config::ChainConfig,
    mock::{MockChat, MockLedger},
};
use signupd_store::{BlacklistStore, CounterStore};
use signupd_test_utils::TestDir;
use signupd_types::{
    ChatId, CreationRequest, MembershipStatus, RequestKind, RequestMode, Requester, RequesterId,
    SignupError,
};

/// A structurally valid key body: 50 base58 characters.
const KEY_BODY: &str = "6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";

const REFERENCE_CHAT: i64 = -1000;
const ORIGIN_CHAT: i64 = -2000;

struct Harness {
    chat: Arc<MockChat>,
    ledger: Arc<MockLedger>,
    guard: Arc<AntiAbuseGuard>,
    workflow: Arc<AccountCreationWorkflow<MockChat, MockLedger>>,
    counter: CounterStore,
    _dir: TestDir,
}

fn harness_with(allowed_chats: Vec<i64>, join_delay: Duration) -> Harness {
    let dir = TestDir::new();
    let chat = Arc::new(MockChat::new());
    let ledger = Arc::new(MockLedger::new());
    let guard = Arc::new(AntiAbuseGuard::new(Some(ChatId::new(REFERENCE_CHAT)), join_delay));
    let chain = ChainConfig::for_test();

    let counter_path = dir.join("counter.json");
    let workflow = Arc::new(AccountCreationWorkflow::new(
        Arc::clone(&chat),
        Arc::clone(&ledger),
        Arc::clone(&guard),
        CreationGate::new(),
        BlacklistStore::open(dir.join("blacklist.json")),
        PremiumNameAllocator::new(CounterStore::open(&counter_path), &chain.premium_suffix),
        allowed_chats.into_iter().map(ChatId::new).collect(),
        chain,
    ));

    Harness {
        chat,
        ledger,
        guard,
        workflow,
        counter: CounterStore::open(counter_path),
        _dir: dir,
    }
}

fn harness() -> Harness {
    harness_with(vec![], Duration::from_secs(600))
}

fn requester(id: i64) -> Requester {
    Requester { id: RequesterId::new(id), display_name: format!("user{id}"), is_automated: false }
}

fn direct_request(id: i64, name: &str) -> CreationRequest {
    CreationRequest {
        requester: requester(id),
        origin_chat: ChatId::new(ORIGIN_CHAT),
        kind: RequestKind::Direct {
            name: name.to_string(),
            public_key: format!("EOS{KEY_BODY}"),
        },
    }
}

fn derived_request(id: i64, source: &str) -> CreationRequest {
    CreationRequest {
        requester: requester(id),
        origin_chat: ChatId::new(ORIGIN_CHAT),
        kind: RequestKind::Derived { source: source.to_string() },
    }
}

fn source_keys() -> signupd_server::ledger::AccountKeys {
    signupd_server::ledger::AccountKeys {
        owner: Some("EOSOWNERKEY".to_string()),
        active: Some("EOSACTIVEKEY".to_string()),
    }
}

#[tokio::test]
async fn test_direct_creation_happy_path() {
    let h = harness();

    let created = h.workflow.handle(direct_request(1, "waxmeetup123")).await.unwrap();
    assert_eq!(created.account_name.as_str(), "waxmeetup123");
    assert_eq!(created.mode, RequestMode::Direct);

    // One transfer submitted, counter untouched, requester recorded.
    assert_eq!(h.ledger.submit_count(), 1);
    assert_eq!(h.counter.value(), 0);
    let err = h.workflow.handle(direct_request(1, "othername123")).await.unwrap_err();
    assert!(matches!(err, SignupError::AlreadyCreated { .. }));

    // A progress notice went out before the submit.
    let sent = h.chat.messages_to(ChatId::new(ORIGIN_CHAT));
    assert!(sent.iter().any(|m| m.contains("in progress")));
}

#[tokio::test]
async fn test_derived_creation_happy_path() {
    let h = harness();
    h.ledger.set_source_account("myeosname", source_keys());

    let created = h.workflow.handle(derived_request(1, "myeosname")).await.unwrap();
    assert_eq!(created.account_name.as_str(), "a11.phoenix");
    assert_eq!(created.mode, RequestMode::Derived);
    assert_eq!(h.counter.value(), 1);

    // The next derived creation gets the next candidate.
    h.ledger.set_source_account("othersource", source_keys());
    let next = h.workflow.handle(derived_request(2, "othersource")).await.unwrap();
    assert_eq!(next.account_name.as_str(), "a12.phoenix");
    assert_eq!(h.counter.value(), 2);
}

#[tokio::test]
async fn test_invalid_name_is_rejected_before_any_ledger_call() {
    let h = harness();

    let err = h.workflow.handle(direct_request(1, "Bad_Name!")).await.unwrap_err();
    assert!(matches!(err, SignupError::Validation { .. }));
    assert_eq!(h.ledger.exists_count(), 0);
    assert_eq!(h.ledger.submit_count(), 0);
    assert_eq!(h.chat.send_count(), 0);
}

#[tokio::test]
async fn test_missing_public_key_is_rejected_before_any_ledger_call() {
    let h = harness();
    let request = CreationRequest {
        requester: requester(1),
        origin_chat: ChatId::new(ORIGIN_CHAT),
        kind: RequestKind::Direct { name: "waxmeetup123".to_string(), public_key: String::new() },
    };

    let err = h.workflow.handle(request).await.unwrap_err();
    assert!(matches!(err, SignupError::Validation { .. }));
    assert_eq!(h.ledger.exists_count(), 0);
}

#[tokio::test]
async fn test_malformed_key_is_rejected_after_availability_check() {
    let h = harness();
    let request = CreationRequest {
        requester: requester(1),
        origin_chat: ChatId::new(ORIGIN_CHAT),
        kind: RequestKind::Direct {
            name: "waxmeetup123".to_string(),
            public_key: "EOSnotakey".to_string(),
        },
    };

    let err = h.workflow.handle(request).await.unwrap_err();
    assert!(matches!(err, SignupError::Validation { .. }));
    assert_eq!(h.ledger.submit_count(), 0);
}

#[tokio::test]
async fn test_automated_agents_are_rejected() {
    let h = harness();
    let mut request = direct_request(1, "waxmeetup123");
    request.requester.is_automated = true;

    let err = h.workflow.handle(request).await.unwrap_err();
    assert!(matches!(err, SignupError::AutomatedAgent));
    assert_eq!(h.ledger.exists_count(), 0);
}

#[tokio::test]
async fn test_chat_allow_list_is_enforced() {
    let h = harness_with(vec![-3000], Duration::from_secs(600));

    let err = h.workflow.handle(direct_request(1, "waxmeetup123")).await.unwrap_err();
    assert!(matches!(err, SignupError::UnauthorizedChat { chat } if chat == ChatId::new(ORIGIN_CHAT)));
}

#[tokio::test]
async fn test_taken_name_is_rejected() {
    let h = harness();
    h.ledger.register("waxmeetup123");

    let err = h.workflow.handle(direct_request(1, "waxmeetup123")).await.unwrap_err();
    assert!(matches!(err, SignupError::NameTaken { name } if name == "waxmeetup123"));
    assert_eq!(h.ledger.submit_count(), 0);
}

#[tokio::test]
async fn test_flagged_requester_is_ineligible() {
    let h = harness();
    for status in [MembershipStatus::Left, MembershipStatus::Kicked, MembershipStatus::Restricted]
    {
        let r = requester(9);
        h.chat.set_status(ChatId::new(REFERENCE_CHAT), r.id, status);
        let err = h.workflow.handle(direct_request(9, "waxmeetup123")).await.unwrap_err();
        assert!(matches!(err, SignupError::Ineligible { .. }), "{status:?}");
    }
    assert_eq!(h.ledger.submit_count(), 0);
}

#[tokio::test]
async fn test_recent_join_is_ineligible() {
    let h = harness();
    let r = requester(1);
    h.guard.record_join(&r);

    let err = h.workflow.handle(direct_request(1, "waxmeetup123")).await.unwrap_err();
    assert!(matches!(err, SignupError::Ineligible { .. }));
}

#[tokio::test]
async fn test_concurrent_requests_get_busy_rejection() {
    let h = harness();
    h.ledger.set_submit_delay(Duration::from_millis(100));

    let first = h.workflow.clone();
    let second = h.workflow.clone();
    let (a, b) = tokio::join!(
        first.handle(direct_request(1, "waxmeetup123")),
        second.handle(direct_request(2, "othername123")),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes.iter().any(|r| matches!(r, Err(SignupError::Busy))),
        "one request must be rejected busy: {outcomes:?}"
    );
    assert_eq!(h.ledger.submit_count(), 1);
}

#[tokio::test]
async fn test_gate_reopens_after_completion() {
    let h = harness();

    h.workflow.handle(direct_request(1, "waxmeetup123")).await.unwrap();
    h.workflow.handle(direct_request(2, "othername123")).await.unwrap();
    assert_eq!(h.ledger.submit_count(), 2);
}

#[tokio::test]
async fn test_submit_failure_leaves_no_state_behind() {
    let h = harness();
    h.ledger.set_source_account("myeosname", source_keys());
    h.ledger.fail_next_submits(1);

    let err = h.workflow.handle(derived_request(1, "myeosname")).await.unwrap_err();
    assert!(matches!(err, SignupError::Ledger { .. }));

    // No blacklist entry, no counter movement, gate released.
    assert_eq!(h.counter.value(), 0);
    let created = h.workflow.handle(derived_request(1, "myeosname")).await.unwrap();
    assert_eq!(created.account_name.as_str(), "a11.phoenix");
}

#[tokio::test]
async fn test_missing_source_account_is_rejected() {
    let h = harness();

    let err = h.workflow.handle(derived_request(1, "ghost")).await.unwrap_err();
    assert!(matches!(err, SignupError::SourceMissing { name } if name == "ghost"));
}

#[tokio::test]
async fn test_keyless_source_account_is_rejected() {
    let h = harness();
    h.ledger.set_source_account("keyless", signupd_server::ledger::AccountKeys::default());

    let err = h.workflow.handle(derived_request(1, "keyless")).await.unwrap_err();
    assert!(matches!(err, SignupError::SourceKeysMissing { name } if name == "keyless"));
}

#[tokio::test]
async fn test_candidate_collision_advances_counter_once() {
    let h = harness();
    h.ledger.set_source_account("myeosname", source_keys());
    h.ledger.register("a11.phoenix");

    let err = h.workflow.handle(derived_request(1, "myeosname")).await.unwrap_err();
    assert!(matches!(err, SignupError::AllocationDrift { candidate } if candidate == "a11.phoenix"));
    assert_eq!(h.counter.value(), 1);
    assert_eq!(h.ledger.submit_count(), 0);

    // The retry picks up the next candidate and succeeds.
    let created = h.workflow.handle(derived_request(1, "myeosname")).await.unwrap();
    assert_eq!(created.account_name.as_str(), "a12.phoenix");
    assert_eq!(h.counter.value(), 2);
}

#[tokio::test]
async fn test_exhausted_namespace_is_an_error() {
    let h = harness();
    h.ledger.set_source_account("myeosname", source_keys());
    h.counter.set(650).unwrap();

    let err = h.workflow.handle(derived_request(1, "myeosname")).await.unwrap_err();
    assert!(matches!(err, SignupError::Exhausted { counter: 650 }));
    assert!(err.is_operational());
    assert_eq!(h.ledger.submit_count(), 0);
}

#[tokio::test]
async fn test_blacklist_survives_across_workflows() {
    let dir = TestDir::new();
    let blacklist_path = dir.join("blacklist.json");
    let chain = ChainConfig::for_test();

    let build = |chat: &Arc<MockChat>, ledger: &Arc<MockLedger>| {
        AccountCreationWorkflow::new(
            Arc::clone(chat),
            Arc::clone(ledger),
            Arc::new(AntiAbuseGuard::new(
                Some(ChatId::new(REFERENCE_CHAT)),
                Duration::from_secs(600),
            )),
            CreationGate::new(),
            BlacklistStore::open(&blacklist_path),
            PremiumNameAllocator::new(
                CounterStore::open(dir.join("counter.json")),
                &chain.premium_suffix,
            ),
            vec![],
            chain.clone(),
        )
    };

    let chat = Arc::new(MockChat::new());
    let ledger = Arc::new(MockLedger::new());
    build(&chat, &ledger).handle(direct_request(1, "waxmeetup123")).await.unwrap();

    // A fresh workflow over the same files still knows the requester.
    let err = build(&chat, &ledger).handle(direct_request(1, "othername123")).await.unwrap_err();
    assert!(matches!(err, SignupError::AlreadyCreated { .. }));
}
