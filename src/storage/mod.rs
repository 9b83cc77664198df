mod ledger;
mod registry;

pub use ledger::*;
pub use registry::*;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::config::LedgerConfig;

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Open a connection pool according to the given configuration.
///
/// WAL mode lets readers proceed while a writer holds the lock; writers
/// queue on the busy timeout instead of failing immediately.
pub async fn connect(config: &LedgerConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(&config.database_path)
        .create_if_missing(config.create_if_missing)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database {}",
                config.database_path.display()
            )
        })
}

/// Run database migrations. Safe to run repeatedly.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(MIGRATION_001_INITIAL)
        .execute(pool)
        .await
        .context("Failed to run migration 001")?;

    tracing::info!("schema is up to date");
    Ok(())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid timestamp: {}", value))?
        .with_timezone(&Utc))
}
