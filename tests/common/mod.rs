// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use bankledger::application::LedgerService;
use bankledger::config::LedgerConfig;
use bankledger::domain::{Account, OwnerId};
use bankledger::storage;
use sqlx::SqlitePool;
use tempfile::TempDir;

pub const ALICE: OwnerId = 1;
pub const BOB: OwnerId = 2;

/// Configuration pointing at a fresh database inside `temp_dir`
pub fn test_config(temp_dir: &TempDir) -> LedgerConfig {
    LedgerConfig::new(temp_dir.path().join("test.db"))
}

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = LedgerService::init(&test_config(&temp_dir)).await?;
    Ok((service, temp_dir))
}

/// Helper to get a migrated pool for storage-level tests
pub async fn test_pool() -> Result<(SqlitePool, TempDir)> {
    let temp_dir = TempDir::new()?;
    let pool = storage::connect(&test_config(&temp_dir)).await?;
    storage::migrate(&pool).await?;
    Ok((pool, temp_dir))
}

/// Open an account for `owner` and fund it with `amount` (skipped when "0")
pub async fn funded_account(
    service: &LedgerService,
    owner: OwnerId,
    amount: &str,
) -> Result<Account> {
    let account = service.create_account(owner, None).await?;
    if amount != "0" {
        service.deposit(owner, account.id, amount).await?;
    }
    Ok(service.get_account(owner, account.id).await?)
}

/// Number of history rows for an account, read straight from the store
pub async fn count_transactions(pool: &SqlitePool, account_id: i64) -> Result<i64> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(pool)
            .await?,
    )
}
