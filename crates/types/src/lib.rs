//! Shared types for the signupd account-creation service.
//!
//! - [`types`]: identifier newtypes, requests, and membership statuses
//! - [`validation`]: account-name and public-key validation
//! - [`error`]: the unified [`SignupError`] taxonomy

pub mod error;
pub mod types;
pub mod validation;

pub use error::{Result, SignupError};
pub use types::{
    AccountName, ChatId, Created, CreationRequest, MembershipStatus, RequestKind, RequestMode,
    Requester, RequesterId,
};
pub use validation::ValidationError;
