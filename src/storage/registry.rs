use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::domain::{Account, AccountId, OwnerId, generate_account_number};

use super::parse_timestamp;

/// Result of trying to open a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Account),
    /// The account number is already in use and could not be replaced.
    NumberTaken(String),
}

/// Owns account identity: creation, lookup, listing and deletion.
///
/// Ownership is not checked here except by `delete_if_zero_balance`; callers
/// are expected to gate reads on the owner themselves.
#[derive(Clone)]
pub struct AccountRegistry {
    pool: SqlitePool,
}

impl AccountRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a new zero-balance account for `owner_id`.
    ///
    /// `desired_number` must already be normalized; `None` means the server
    /// picks a 12-digit number. A collision on a generated number is retried
    /// once with a fresh one. A collision on a caller-supplied number is final.
    pub async fn create(
        &self,
        owner_id: OwnerId,
        desired_number: Option<&str>,
    ) -> Result<CreateOutcome> {
        self.create_with(owner_id, desired_number, generate_account_number)
            .await
    }

    /// Same as [`create`](Self::create), drawing generated numbers from `next_number`.
    /// It is called at most twice.
    pub async fn create_with(
        &self,
        owner_id: OwnerId,
        desired_number: Option<&str>,
        mut next_number: impl FnMut() -> String,
    ) -> Result<CreateOutcome> {
        let Some(number) = desired_number else {
            let first = next_number();
            if let Some(account) = self.insert(owner_id, &first).await? {
                return Ok(CreateOutcome::Created(account));
            }

            tracing::warn!(owner_id, "generated account number collided, retrying once");
            let second = next_number();
            return Ok(match self.insert(owner_id, &second).await? {
                Some(account) => CreateOutcome::Created(account),
                None => CreateOutcome::NumberTaken(second),
            });
        };

        Ok(match self.insert(owner_id, number).await? {
            Some(account) => CreateOutcome::Created(account),
            None => CreateOutcome::NumberTaken(number.to_string()),
        })
    }

    /// Insert one account row. `Ok(None)` signals a unique violation on the number.
    async fn insert(&self, owner_id: OwnerId, account_number: &str) -> Result<Option<Account>> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (owner_id, account_number, balance_cents, created_at)
            VALUES (?, ?, 0, ?)
            RETURNING id
            "#,
        )
        .bind(owner_id)
        .bind(account_number)
        .bind(created_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => {
                let account = Account {
                    id: row.get("id"),
                    owner_id,
                    account_number: account_number.to_string(),
                    balance_cents: 0,
                    created_at,
                };
                tracing::info!(account_id = account.id, owner_id, "account created");
                Ok(Some(account))
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(e).context("Failed to insert account"),
        }
    }

    /// Get an account by ID, regardless of owner.
    pub async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, account_number, balance_cents, created_at
            FROM accounts
            WHERE id = ? AND closed_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    /// List an owner's accounts in creation order.
    pub async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, account_number, balance_cents, created_at
            FROM accounts
            WHERE owner_id = ? AND closed_at IS NULL
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Close the account iff it is open, belongs to `owner_id` and holds exactly 0.00.
    ///
    /// All conditions are evaluated by one statement, so a deposit racing with
    /// the delete either lands first (and the delete matches nothing) or finds
    /// the account closed. The row and its history stay in the store; every
    /// lookup skips closed accounts. Returns whether an account was closed.
    pub async fn delete_if_zero_balance(&self, id: AccountId, owner_id: OwnerId) -> Result<bool> {
        let deleted = sqlx::query(
            r#"
            UPDATE accounts SET closed_at = ?
            WHERE id = ? AND owner_id = ? AND balance_cents = 0 AND closed_at IS NULL
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .context("Failed to delete account")?
        .rows_affected();

        if deleted > 0 {
            tracing::info!(account_id = id, owner_id, "account deleted");
        } else {
            tracing::warn!(account_id = id, owner_id, "conditional delete matched no account");
        }
        Ok(deleted > 0)
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            account_number: row.get("account_number"),
            balance_cents: row.get("balance_cents"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }
}
