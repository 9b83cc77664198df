use thiserror::Error;

use crate::domain::{AccountId, AccountNumberError, Cents, ParseAmountError, format_cents};

/// Coarse outcome class, for mapping onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] ParseAmountError),

    #[error("Invalid account number: {0}")]
    InvalidAccountNumber(#[from] AccountNumberError),

    #[error("Invalid transaction type '{0}': expected DEPOSIT or WITHDRAW")]
    InvalidTransactionKind(String),

    /// Missing and not-owned accounts are reported identically.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Insufficient funds in account {account_id}: balance {}, required {}", money(.balance), money(.required))]
    InsufficientFunds {
        account_id: AccountId,
        balance: Cents,
        required: Cents,
    },

    #[error("Balance must be zero before deletion (account {account_id}, balance {})", money(.balance))]
    NonZeroBalance { account_id: AccountId, balance: Cents },

    #[error("Account number already in use: {0}")]
    AccountNumberTaken(String),

    /// The conditional update failed but a re-read shows nothing that explains it.
    #[error("Account {0} changed concurrently, try again")]
    AccountChanged(AccountId),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

fn money(cents: &Cents) -> String {
    format_cents(*cents)
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidAmount(_)
            | AppError::InvalidAccountNumber(_)
            | AppError::InvalidTransactionKind(_) => ErrorKind::Validation,
            AppError::AccountNotFound(_) => ErrorKind::NotFound,
            AppError::InsufficientFunds { .. }
            | AppError::NonZeroBalance { .. }
            | AppError::AccountNumberTaken(_)
            | AppError::AccountChanged(_) => ErrorKind::Conflict,
            AppError::Database(_) => ErrorKind::Internal,
        }
    }
}
