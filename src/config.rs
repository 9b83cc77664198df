//! Runtime configuration for the ledger store.

use std::path::PathBuf;
use std::time::Duration;

/// Default SQLite database file, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = "bank.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub database_path: PathBuf,
    /// Upper bound on pooled connections, i.e. on concurrently running units of work
    pub max_connections: u32,
    /// How long a writer waits for the store's write lock before giving up
    pub busy_timeout: Duration,
    pub create_if_missing: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            max_connections: 8,
            busy_timeout: Duration::from_secs(5),
            create_if_missing: true,
        }
    }
}

impl LedgerConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Fail instead of creating a fresh database file.
    pub fn existing_only(mut self) -> Self {
        self.create_if_missing = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = LedgerConfig::new("/tmp/x.db")
            .with_max_connections(0)
            .with_busy_timeout(Duration::from_millis(250))
            .existing_only();

        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!config.create_if_missing);
    }
}
