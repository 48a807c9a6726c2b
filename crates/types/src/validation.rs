//! Input validation for creation requests.
//!
//! Validates target-network account names, source-network account names, and
//! public keys before any network call is made.
//!
//! ## Character Whitelists
//!
//! - Target account names: `[a-z1-5]{12}` — exactly 12 characters.
//! - Source account names: `[a-z1-5.]{1,13}` — dots allowed for sub-names.
//! - Public keys: structural only — a known prefix followed by base58
//!   (`[1-9A-HJ-NP-Za-km-z]`). Checksum verification belongs to the key
//!   scheme's own tooling.

use std::fmt;

use crate::types::AccountName;

/// Required length of a target-network account name.
pub const TARGET_NAME_LEN: usize = 12;

/// Maximum length of a source-network account name.
pub const SOURCE_NAME_MAX_LEN: usize = 13;

/// Validation error with structured context.
///
/// Contains the specific constraint that was violated and the field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the violated constraint.
    pub constraint: String,
}

impl ValidationError {
    fn new(field: &str, constraint: impl Into<String>) -> Self {
        Self { field: field.to_string(), constraint: constraint.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

impl std::error::Error for ValidationError {}

/// Validates a user-supplied target-network account name.
///
/// Target names must:
/// - Be non-empty
/// - Be exactly [`TARGET_NAME_LEN`] characters
/// - Contain only `[a-z1-5]`
///
/// # Errors
///
/// Returns [`ValidationError`] naming the first violated constraint.
pub fn validate_target_name(name: &str) -> Result<AccountName, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new("account_name", "must not be empty"));
    }
    if name.chars().count() != TARGET_NAME_LEN {
        return Err(ValidationError::new(
            "account_name",
            format!("must be exactly {TARGET_NAME_LEN} characters, no more, no less"),
        ));
    }
    if let Some(pos) = name.find(|c: char| !is_target_name_char(c)) {
        return Err(ValidationError::new(
            "account_name",
            format!(
                "contains invalid character {:?} at byte offset {}; allowed: [a-z1-5]",
                name[pos..].chars().next().unwrap_or('\0'),
                pos
            ),
        ));
    }
    Ok(AccountName::new(name))
}

/// Validates a source-network account name for derived-mode requests.
///
/// Source names must:
/// - Be non-empty
/// - Not exceed [`SOURCE_NAME_MAX_LEN`] characters
/// - Contain only `[a-z1-5.]`
///
/// # Errors
///
/// Returns [`ValidationError`] naming the first violated constraint.
pub fn validate_source_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new("source_account", "must not be empty"));
    }
    if name.chars().count() > SOURCE_NAME_MAX_LEN {
        return Err(ValidationError::new(
            "source_account",
            format!("must not exceed {SOURCE_NAME_MAX_LEN} characters"),
        ));
    }
    if let Some(pos) = name.find(|c: char| !is_source_name_char(c)) {
        return Err(ValidationError::new(
            "source_account",
            format!(
                "contains invalid character {:?} at byte offset {}; allowed: [a-z1-5.]",
                name[pos..].chars().next().unwrap_or('\0'),
                pos
            ),
        ));
    }
    Ok(())
}

/// Checks that a required field is present (non-empty).
///
/// # Errors
///
/// Returns [`ValidationError`] if `value` is empty.
pub fn require_present(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

/// Validates the structure of a public key for the target network's scheme.
///
/// Accepted shapes:
/// - Legacy: `EOS` followed by exactly 50 base58 characters
/// - Typed: `PUB_K1_` or `PUB_R1_` followed by 50–60 base58 characters
///
/// No checksum verification is performed.
///
/// # Errors
///
/// Returns [`ValidationError`] if the key is empty, carries an unknown
/// prefix, has the wrong length, or contains non-base58 characters.
pub fn validate_public_key(key: &str) -> Result<(), ValidationError> {
    require_present("public_key", key)?;

    let body = if let Some(rest) = key.strip_prefix("EOS") {
        if rest.chars().count() != 50 {
            return Err(ValidationError::new(
                "public_key",
                "legacy key must be EOS followed by exactly 50 base58 characters",
            ));
        }
        rest
    } else if let Some(rest) =
        key.strip_prefix("PUB_K1_").or_else(|| key.strip_prefix("PUB_R1_"))
    {
        let len = rest.chars().count();
        if !(50..=60).contains(&len) {
            return Err(ValidationError::new(
                "public_key",
                "typed key body must be 50 to 60 base58 characters",
            ));
        }
        rest
    } else {
        return Err(ValidationError::new(
            "public_key",
            "must start with EOS, PUB_K1_, or PUB_R1_",
        ));
    };

    if let Some(pos) = body.find(|c: char| !is_base58_char(c)) {
        return Err(ValidationError::new(
            "public_key",
            format!(
                "contains non-base58 character {:?} at byte offset {}",
                body[pos..].chars().next().unwrap_or('\0'),
                pos
            ),
        ));
    }
    Ok(())
}

fn is_target_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || ('1'..='5').contains(&c)
}

fn is_source_name_char(c: char) -> bool {
    is_target_name_char(c) || c == '.'
}

fn is_base58_char(c: char) -> bool {
    c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l')
}
