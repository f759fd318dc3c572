//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`]. The variants separate
//! programmer errors (using the store before it is open), fatal setup
//! failures, and storage faults the caller may choose to retry.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// An operation was attempted while the store is not open.
    ///
    /// Raised before `initialize`, after `close`, and for queries whose
    /// pool was closed while they were in flight.
    #[error("traffic store is not initialized")]
    NotInitialized,

    /// The database file could not be opened or the schema not created.
    #[error("failed to initialize traffic store: {source}")]
    StoreInit {
        /// The underlying `SQLite` error.
        source: sqlx::Error,
    },

    /// A query or write failed at the storage layer.
    #[error("SQLite error: {0}")]
    StoreIo(#[source] sqlx::Error),

    /// An event was rejected before reaching the store.
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// Query parameters were rejected before reaching the store.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl From<sqlx::Error> for DbError {
    /// A pool closed underneath a running query reads as "not initialized";
    /// everything else is a storage fault.
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => Self::NotInitialized,
            other => Self::StoreIo(other),
        }
    }
}

impl DbError {
    /// Wrap a failure that happened while opening the store.
    pub const fn init(source: sqlx::Error) -> Self {
        Self::StoreInit { source }
    }
}
