use super::{Cents, Transaction};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: i64 = 100;
pub const MAX_PAGE_LIMIT: i64 = 200;

/// Offset pagination over a transaction history.
/// Out-of-range values are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Replay a history (oldest first) against a 0.00 opening balance.
pub fn replay_balance(transactions: &[Transaction]) -> Cents {
    transactions
        .iter()
        .fold(0, |balance, tx| balance + tx.signed_amount())
}

/// Check that every entry's `balance_after` follows from the previous one.
/// Returns the id of the first entry that breaks the chain.
pub fn first_broken_link(transactions: &[Transaction]) -> Option<super::TransactionId> {
    let mut running: Cents = 0;
    for tx in transactions {
        running += tx.signed_amount();
        if tx.balance_after_cents != running || running < 0 {
            return Some(tx.id);
        }
    }
    None
}
