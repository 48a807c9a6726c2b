//! Premium account-name allocation.
//!
//! Deterministically maps the persisted counter to a short candidate name:
//! one letter and two digits from a restricted digit set, followed by a
//! fixed suffix domain label (`a11.<suffix>`, `a12.<suffix>`, ...,
//! `a55.<suffix>`, `b11.<suffix>`, ...).
//!
//! # Derivation
//!
//! The counter is read as a mixed-radix number over 26 letters × 5 digits ×
//! 5 digits. Each letter spans 25 consecutive counter values (the 5×5 digit
//! permutations), giving a namespace of 650 names. Reaching the end of the
//! namespace is an explicit error; the allocator never wraps around.
//!
//! # Mutation discipline
//!
//! [`next`](PremiumNameAllocator::next) is a pure function of the persisted
//! counter. [`advance`](PremiumNameAllocator::advance) must be called
//! exactly once per confirmed external name consumption — a successful
//! creation or a detected collision — never more, never less, so the counter
//! keeps meaning "next name to try".

use signupd_store::CounterStore;
use signupd_types::{AccountName, Result, error::ExhaustedSnafu};
use snafu::ensure;

const ALPHABET: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8; 5] = b"12345";

/// Digit permutations per letter.
const CODES_PER_LETTER: u64 = 25;

/// Total names the allocator can produce before the letter index would wrap.
pub const NAMESPACE_SIZE: u64 = ALPHABET.len() as u64 * CODES_PER_LETTER;

/// Allocator for premium target-network names.
#[derive(Debug)]
pub struct PremiumNameAllocator {
    counter: CounterStore,
    suffix: String,
}

impl PremiumNameAllocator {
    /// Creates an allocator over `counter` with the given suffix label.
    pub fn new(counter: CounterStore, suffix: impl Into<String>) -> Self {
        Self { counter, suffix: suffix.into() }
    }

    /// Returns the candidate name for the current counter value.
    ///
    /// Does not mutate state: calling `next` twice without an intervening
    /// [`advance`](Self::advance) yields the same candidate.
    ///
    /// # Errors
    ///
    /// Returns [`SignupError::Exhausted`](signupd_types::SignupError) once
    /// the counter reaches [`NAMESPACE_SIZE`].
    pub fn next(&self) -> Result<AccountName> {
        let counter = self.counter.value();
        ensure!(counter < NAMESPACE_SIZE, ExhaustedSnafu { counter });
        Ok(AccountName::new(format!("{}.{}", derive_code(counter), self.suffix)))
    }

    /// Advances the counter past the current candidate.
    pub fn advance(&self) {
        self.counter.increment();
    }

    /// Current counter value, for logging and monitoring.
    #[must_use]
    pub fn counter(&self) -> u64 {
        self.counter.value()
    }
}

/// Derives the 3-symbol code for a counter value.
///
/// `index1` selects the letter, `index2` and `index3` the two digits:
/// counter 0 → `a11`, 24 → `a55`, 25 → `b11`, 26 → `b12`.
fn derive_code(counter: u64) -> String {
    let index1 = (counter / CODES_PER_LETTER) as usize;
    let index2 = ((counter % CODES_PER_LETTER) / DIGITS.len() as u64) as usize;
    let index3 = (counter % DIGITS.len() as u64) as usize;
    [
        ALPHABET[index1 % ALPHABET.len()],
        DIGITS[index2 % DIGITS.len()],
        DIGITS[index3 % DIGITS.len()],
    ]
    .iter()
    .map(|&b| b as char)
    .collect()
}
