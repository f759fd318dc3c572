//! `SQLite` connection pool and configuration.
//!
//! The store lives in a single database file opened in WAL mode so that
//! report queries read alongside the single writer. `SQLite`'s own locking
//! serializes concurrent appends; no application-level write lock exists.
//!
//! Uses [`sqlx`] with runtime query construction (not compile-time checked)
//! so builds never need a database. All queries are parameterized.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tally_types::labels::DEFAULT_BATCH_SIZE;

/// Default maximum number of connections in the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// Default time a connection waits on a locked database, in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Default pool acquire timeout in seconds.
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Configuration for the traffic store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the `SQLite` database file. Created if missing.
    pub path: PathBuf,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// How long a statement waits for a competing writer.
    pub busy_timeout: Duration,
    /// How long a caller waits for a free connection.
    pub acquire_timeout: Duration,
    /// Events fetched per cursor batch when the caller does not choose.
    pub batch_size: usize,
}

impl StoreConfig {
    /// Create a configuration for the database file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub const fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the busy timeout.
    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Set the pool acquire timeout.
    #[must_use]
    pub const fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set the default cursor batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }
}

/// Open a connection pool for `config`, creating the file and its parent
/// directory when missing.
pub(crate) async fn open_pool(config: &StoreConfig) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = config.path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(config.busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await?;

    tracing::info!(
        path = %config.path.display(),
        max_connections = config.max_connections,
        "Opened SQLite pool"
    );

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = StoreConfig::new("data/tally.db");
        assert_eq!(config.path, PathBuf::from("data/tally.db"));
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.batch_size, 1000);
    }

    #[test]
    fn config_builders_override_defaults() {
        let config = StoreConfig::new("tally.db")
            .with_max_connections(2)
            .with_busy_timeout(Duration::from_millis(250))
            .with_batch_size(50);
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.batch_size, 50);
    }
}
