//! Table and index definitions for the event log.
//!
//! The schema is created with idempotent `IF NOT EXISTS` statements each
//! time the store opens; there is no migration history.
//!
//! `timestamp` holds the caller's event time in milliseconds while
//! `created_at` holds the ingestion time in seconds. Both units are part of
//! the on-disk contract.

use sqlx::SqlitePool;

/// The append-only event table. `AUTOINCREMENT` keeps ids from ever being
/// reused, even after the highest row is removed by external tooling.
pub const CREATE_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS traffic_events (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id      TEXT    NOT NULL,
    path         TEXT,
    user_agent   TEXT,
    ip_address   TEXT,
    country      TEXT,
    city         TEXT,
    referrer     TEXT,
    request_type TEXT,
    timestamp    INTEGER NOT NULL,
    created_at   INTEGER NOT NULL
)";

/// Range scans by site and event time.
pub const CREATE_INDEX_SITE_TIMESTAMP: &str = r"
CREATE INDEX IF NOT EXISTS idx_traffic_site_timestamp
    ON traffic_events (site_id, timestamp)";

/// Cursor scans: `id > ?` with site and time filters.
pub const CREATE_INDEX_CURSOR: &str = r"
CREATE INDEX IF NOT EXISTS idx_traffic_cursor
    ON traffic_events (id, site_id, timestamp)";

/// Referrer grouping.
pub const CREATE_INDEX_REFERRER: &str = r"
CREATE INDEX IF NOT EXISTS idx_traffic_referrer
    ON traffic_events (referrer)";

/// Create the event table and its indexes if they do not exist.
pub(crate) async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in [
        CREATE_EVENTS_TABLE,
        CREATE_INDEX_SITE_TIMESTAMP,
        CREATE_INDEX_CURSOR,
        CREATE_INDEX_REFERRER,
    ] {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::debug!("Traffic schema ensured");
    Ok(())
}
