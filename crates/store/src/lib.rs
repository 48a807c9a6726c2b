//! Durable persistence for signupd.
//!
//! Two small single-writer stores back the account-creation workflow:
//! - [`BlacklistStore`]: the set of requester ids that already completed a
//!   creation (the de-duplication ledger)
//! - [`CounterStore`]: the monotonic premium-name counter
//!
//! Both sit on [`JsonFile`], a serde-JSON document with atomic
//! replace-on-write. Reads degrade to the default value on unreadable or
//! corrupt files: persistence faults are logged, never fatal. The workflow's
//! single-flight gate serializes all mutations, so no cross-process locking
//! is attempted.

pub mod blacklist;
pub mod counter;
pub mod error;
pub mod kv;

pub use blacklist::BlacklistStore;
pub use counter::CounterStore;
pub use error::{Result, StoreError};
pub use kv::JsonFile;
