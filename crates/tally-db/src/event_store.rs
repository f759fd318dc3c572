//! Event store operations on the `traffic_events` table.
//!
//! Events are append-only: this module inserts rows and reads them back,
//! and nothing in the crate updates or deletes an event. Ids come from the
//! table's `AUTOINCREMENT` key, so their order matches commit order.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tally_types::labels::LATEST_EVENTS_LIMIT;
use tally_types::{SiteId, TrafficEvent, TrafficEventInput};

use crate::error::DbError;

/// Operations on the `traffic_events` table.
#[derive(Debug, Clone)]
pub struct EventStore {
    pool: SqlitePool,
}

impl EventStore {
    /// Create an event store bound to a connection pool.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one event, ingested at `ingested_at`, and return its id.
    ///
    /// Blank optional attributes are stored as `NULL`. A missing event
    /// `timestamp` defaults to `ingested_at` in milliseconds; `created_at`
    /// is always `ingested_at` in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidEvent`] if the site id is blank, or
    /// [`DbError::StoreIo`] if the insert fails.
    pub async fn append(
        &self,
        input: &TrafficEventInput,
        ingested_at: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        if input.site_id.is_blank() {
            return Err(DbError::InvalidEvent(String::from("siteId must not be empty")));
        }

        let event = input.clone().normalized();
        let timestamp = event
            .timestamp
            .unwrap_or_else(|| ingested_at.timestamp_millis());
        let created_at = ingested_at.timestamp();

        let result = sqlx::query(
            r"INSERT INTO traffic_events
                  (site_id, path, user_agent, ip_address, country, city, referrer, request_type, timestamp, created_at)
              VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(event.site_id.as_str())
        .bind(event.path.as_deref())
        .bind(event.user_agent.as_deref())
        .bind(event.ip_address.as_deref())
        .bind(event.country.as_deref())
        .bind(event.city.as_deref())
        .bind(event.referrer.as_deref())
        .bind(event.request_type.as_deref())
        .bind(timestamp)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(id, site_id = %event.site_id, timestamp, "Appended traffic event");
        Ok(id)
    }

    /// The most recent events by id, newest first, optionally for one site.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StoreIo`] if the query fails.
    pub async fn latest(&self, site_id: Option<&SiteId>) -> Result<Vec<TrafficEvent>, DbError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r"SELECT id, site_id, path, user_agent, ip_address, country, city, referrer, request_type, timestamp, created_at
              FROM traffic_events
              WHERE ?1 IS NULL OR site_id = ?1
              ORDER BY id DESC
              LIMIT ?2",
        )
        .bind(site_id.map(SiteId::as_str))
        .bind(LATEST_EVENTS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TrafficEvent::from).collect())
    }
}

/// A row from the `traffic_events` table.
///
/// Uses runtime types rather than compile-time checked types to avoid
/// requiring a database during builds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Auto-incremented sequence number.
    pub id: i64,
    /// Owning site.
    pub site_id: String,
    /// Requested path.
    pub path: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client country.
    pub country: Option<String>,
    /// Client city.
    pub city: Option<String>,
    /// Referring URL.
    pub referrer: Option<String>,
    /// Request class.
    pub request_type: Option<String>,
    /// Event time in milliseconds.
    pub timestamp: i64,
    /// Ingestion time in seconds.
    pub created_at: i64,
}

impl From<EventRow> for TrafficEvent {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            site_id: SiteId::from(row.site_id),
            path: row.path,
            user_agent: row.user_agent,
            ip_address: row.ip_address,
            country: row.country,
            city: row.city,
            referrer: row.referrer,
            request_type: row.request_type,
            timestamp: row.timestamp,
            created_at: row.created_at,
        }
    }
}
