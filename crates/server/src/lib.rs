//! signupd server library.
//!
//! Turns chat commands into on-chain account creations:
//! - [`workflow`]: the account-creation pipeline (validation, anti-abuse,
//!   single-flight, persistence)
//! - [`guard`], [`gate`], [`allocator`]: the workflow's moving parts
//! - [`chat`], [`ledger`]: capability traits for the external collaborators
//! - [`telegram`], [`chain`]: the production HTTP bindings for those traits
//! - [`mock`]: controllable in-memory implementations for tests
//! - [`bot`]: inbound-event dispatch and user-facing message rendering

pub mod allocator;
pub mod bot;
pub mod chain;
pub mod chat;
pub mod config;
pub mod gate;
pub mod guard;
pub mod ledger;
pub mod mock;
pub mod shutdown;
pub mod telegram;
pub mod workflow;

pub use allocator::PremiumNameAllocator;
pub use bot::Bot;
pub use chain::HttpLedger;
pub use config::Config;
pub use gate::{CreationGate, CreationPermit};
pub use guard::AntiAbuseGuard;
pub use telegram::TelegramChat;
pub use workflow::AccountCreationWorkflow;
