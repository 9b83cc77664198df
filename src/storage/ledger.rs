use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::domain::{AccountId, Amount, Page, Transaction, TransactionKind};

use super::parse_timestamp;

/// Owns balance mutation and the append-only transaction history.
///
/// Every mutation is a single unit of work: conditional update, read of the
/// resulting balance, insert of the history row, commit. Any failure before
/// the commit drops the unit and rolls everything back. Correctness rests on
/// the conditional update alone; there is no in-process locking.
#[derive(Clone)]
pub struct TransactionLedger {
    pool: SqlitePool,
}

impl TransactionLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add `amount` to the balance and record a DEPOSIT.
    /// `Ok(None)` means the account does not exist or is closed.
    pub async fn deposit(&self, account_id: AccountId, amount: Amount) -> Result<Option<Transaction>> {
        self.apply(account_id, TransactionKind::Deposit, amount).await
    }

    /// Take `amount` from the balance and record a WITHDRAW.
    /// `Ok(None)` means the account does not exist, is closed or holds less than `amount`.
    pub async fn withdraw(&self, account_id: AccountId, amount: Amount) -> Result<Option<Transaction>> {
        self.apply(account_id, TransactionKind::Withdraw, amount).await
    }

    async fn apply(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount: Amount,
    ) -> Result<Option<Transaction>> {
        let amount_cents = amount.cents();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin ledger transaction")?;

        // The guard lives in the predicate: check and write are one statement.
        let update = match kind {
            TransactionKind::Deposit => sqlx::query(
                r#"
                UPDATE accounts SET balance_cents = balance_cents + ?
                WHERE id = ? AND closed_at IS NULL
                "#,
            )
            .bind(amount_cents)
            .bind(account_id),
            TransactionKind::Withdraw => sqlx::query(
                r#"
                UPDATE accounts SET balance_cents = balance_cents - ?
                WHERE id = ? AND closed_at IS NULL AND balance_cents >= ?
                "#,
            )
            .bind(amount_cents)
            .bind(account_id)
            .bind(amount_cents),
        };

        let updated = update
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to apply {} to account {}", kind, account_id))?
            .rows_affected();

        if updated != 1 {
            tx.rollback()
                .await
                .context("Failed to roll back ledger transaction")?;
            tracing::warn!(account_id, %kind, amount = %amount, "conditional update matched no account");
            return Ok(None);
        }

        let balance_after_cents: i64 =
            sqlx::query_scalar("SELECT balance_cents FROM accounts WHERE id = ?")
                .bind(account_id)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to read resulting balance")?;

        let created_at = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (account_id, kind, amount_cents, balance_after_cents, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(account_id)
        .bind(kind.as_str())
        .bind(amount_cents)
        .bind(balance_after_cents)
        .bind(created_at.to_rfc3339())
        .fetch_one(&mut *tx)
        .await
        .context("Failed to append transaction")?;

        tx.commit()
            .await
            .context("Failed to commit ledger transaction")?;

        tracing::debug!(
            account_id,
            transaction_id = id,
            %kind,
            amount = %amount,
            balance_after_cents,
            "ledger entry committed"
        );

        Ok(Some(Transaction {
            id,
            account_id,
            kind,
            amount_cents,
            balance_after_cents,
            created_at,
        }))
    }

    /// One page of an account's history, newest first.
    pub async fn list_by_account(&self, account_id: AccountId, page: Page) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, kind, amount_cents, balance_after_cents, created_at
            FROM transactions
            WHERE account_id = ?
            ORDER BY id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(account_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Full history of an account, oldest first.
    pub async fn history(&self, account_id: AccountId) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, kind, amount_cents, balance_after_cents, created_at
            FROM transactions
            WHERE account_id = ?
            ORDER BY id
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load transaction history")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let kind_str: String = row.get("kind");
        let created_at_str: String = row.get("created_at");

        Ok(Transaction {
            id: row.get("id"),
            account_id: row.get("account_id"),
            kind: TransactionKind::parse(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind_str))?,
            amount_cents: row.get("amount_cents"),
            balance_after_cents: row.get("balance_after_cents"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }
}
