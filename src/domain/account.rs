use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Cents;

pub type AccountId = i64;

/// Identity of an authenticated user, as handed over by the external authenticator.
pub type OwnerId = i64;

/// Length of server-generated account numbers.
pub const GENERATED_ACCOUNT_NUMBER_LEN: usize = 12;

/// Longest caller-supplied account number the store accepts.
pub const MAX_ACCOUNT_NUMBER_LEN: usize = 64;

/// A bank account owned by a single user.
/// The balance only ever changes through ledger deposits and withdrawals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub owner_id: OwnerId,
    pub account_number: String,
    /// Current balance in cents, never negative
    pub balance_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_owned_by(&self, owner_id: OwnerId) -> bool {
        self.owner_id == owner_id
    }

    pub fn has_zero_balance(&self) -> bool {
        self.balance_cents == 0
    }
}

/// Generate a random 12-digit account number.
pub fn generate_account_number() -> String {
    let mut rng = rand::thread_rng();
    (0..GENERATED_ACCOUNT_NUMBER_LEN)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountNumberError {
    #[error("account number is longer than 64 characters")]
    TooLong,
    #[error("account number may only contain letters, digits and '-'")]
    InvalidCharacters,
}

/// Normalize a caller-supplied account number.
///
/// Returns `Ok(None)` when the input is absent or blank, meaning the server
/// should generate one.
pub fn normalize_account_number(
    input: Option<&str>,
) -> Result<Option<String>, AccountNumberError> {
    let Some(trimmed) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if trimmed.len() > MAX_ACCOUNT_NUMBER_LEN {
        return Err(AccountNumberError::TooLong);
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(AccountNumberError::InvalidCharacters);
    }

    Ok(Some(trimmed.to_string()))
}
