use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents};

pub type TransactionId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdraw => "WITHDRAW",
        }
    }

    /// Lenient parse: case-insensitive, surrounding whitespace ignored.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DEPOSIT" => Some(TransactionKind::Deposit),
            "WITHDRAW" => Some(TransactionKind::Withdraw),
            _ => None,
        }
    }

    /// Effect of an amount of this kind on the balance.
    pub fn signed(&self, amount_cents: Cents) -> Cents {
        match self {
            TransactionKind::Deposit => amount_cents,
            TransactionKind::Withdraw => -amount_cents,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable ledger entry. Once committed it is never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned, increases in commit order
    pub id: TransactionId,
    pub account_id: AccountId,
    pub kind: TransactionKind,
    /// Always positive
    pub amount_cents: Cents,
    /// Balance of the account right after this entry was applied
    pub balance_after_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn signed_amount(&self) -> Cents {
        self.kind.signed(self.amount_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing_is_lenient() {
        assert_eq!(TransactionKind::parse("deposit"), Some(TransactionKind::Deposit));
        assert_eq!(TransactionKind::parse(" Withdraw "), Some(TransactionKind::Withdraw));
        assert_eq!(TransactionKind::parse("WITHDRAW"), Some(TransactionKind::Withdraw));
        assert_eq!(TransactionKind::parse("transfer"), None);
        assert_eq!(TransactionKind::parse(""), None);
    }

    #[test]
    fn test_signed_amount() {
        assert_eq!(TransactionKind::Deposit.signed(500), 500);
        assert_eq!(TransactionKind::Withdraw.signed(500), -500);
    }

    #[test]
    fn test_kind_serializes_uppercase() {
        let json = serde_json::to_string(&TransactionKind::Withdraw).unwrap();
        assert_eq!(json, "\"WITHDRAW\"");
    }
}
