//! Cursor-based streaming reads over the event log.
//!
//! Offset pagination skips or repeats rows when inserts land between
//! pages. The cursor here instead remembers the highest id it has handed
//! out and asks for `id > last_id` each time, so every id is delivered at
//! most once and in ascending order. Events that existed when the scan
//! started are always delivered; events appended mid-scan may or may not
//! be, depending on timing.
//!
//! ```text
//! last_id = 0
//! loop:
//!   batch = SELECT ... WHERE site_id = ? AND timestamp BETWEEN ? AND ?
//!                        AND id > last_id ORDER BY id LIMIT batch_size
//!   if batch is empty: stop
//!   yield batch; last_id = max(batch.id)
//! ```

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use sqlx::SqlitePool;
use tally_types::{SiteId, TimeRange, TrafficEvent};

use crate::error::DbError;
use crate::event_store::EventRow;

/// Cursor value below every id the store can assign.
const CURSOR_START: i64 = 0;

/// Pull-based reader that pages through one site's events in id order.
///
/// A cursor is forward-only. Once a batch fails or comes back empty the
/// cursor is exhausted; scanning again means building a new cursor, which
/// starts from the beginning.
#[derive(Debug)]
pub struct EventCursor {
    pool: SqlitePool,
    site_id: SiteId,
    range: TimeRange,
    batch_size: i64,
    last_id: i64,
    exhausted: bool,
}

impl EventCursor {
    /// Create a cursor over `site_id`'s events whose timestamp lies in
    /// `range`, fetching `batch_size` rows per query.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidQuery`] if `batch_size` is zero or too
    /// large for a `LIMIT` clause.
    pub fn new(
        pool: SqlitePool,
        site_id: SiteId,
        range: TimeRange,
        batch_size: usize,
    ) -> Result<Self, DbError> {
        if batch_size == 0 {
            return Err(DbError::InvalidQuery(String::from(
                "batch size must be at least 1",
            )));
        }
        let batch_size = i64::try_from(batch_size)
            .map_err(|e| DbError::InvalidQuery(format!("batch size {batch_size}: {e}")))?;

        Ok(Self {
            pool,
            site_id,
            range,
            batch_size,
            last_id: CURSOR_START,
            exhausted: false,
        })
    }

    /// Highest id delivered so far, or `0` before the first batch.
    pub const fn last_id(&self) -> i64 {
        self.last_id
    }

    /// Whether the cursor has reached the end of the scan.
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Fetch the next batch, or `None` once no events remain.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StoreIo`] if the query fails, or
    /// [`DbError::NotInitialized`] if the pool was closed. Either ends the
    /// scan; the failed batch is not retried.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<TrafficEvent>>, DbError> {
        if self.exhausted {
            return Ok(None);
        }

        let fetched = sqlx::query_as::<_, EventRow>(
            r"SELECT id, site_id, path, user_agent, ip_address, country, city, referrer, request_type, timestamp, created_at
              FROM traffic_events
              WHERE site_id = ?1
                AND timestamp BETWEEN ?2 AND ?3
                AND id > ?4
              ORDER BY id ASC
              LIMIT ?5",
        )
        .bind(self.site_id.as_str())
        .bind(self.range.start())
        .bind(self.range.end())
        .bind(self.last_id)
        .bind(self.batch_size)
        .fetch_all(&self.pool)
        .await;

        let rows = match fetched {
            Ok(rows) => rows,
            Err(e) => {
                self.exhausted = true;
                return Err(DbError::from(e));
            }
        };

        let Some(last) = rows.last() else {
            self.exhausted = true;
            return Ok(None);
        };
        self.last_id = last.id;

        tracing::trace!(
            site_id = %self.site_id,
            rows = rows.len(),
            last_id = self.last_id,
            "Fetched cursor batch"
        );

        Ok(Some(rows.into_iter().map(TrafficEvent::from).collect()))
    }

    /// Turn the cursor into a lazy stream of individual events.
    ///
    /// Batches are fetched on demand as the consumer polls. The first error
    /// is yielded and ends the stream.
    pub fn into_stream(self) -> BoxStream<'static, Result<TrafficEvent, DbError>> {
        stream::try_unfold(self, |mut cursor| async move {
            let batch = cursor.next_batch().await?;
            Ok::<_, DbError>(batch.map(|events| (events, cursor)))
        })
        .map_ok(|events| stream::iter(events.into_iter().map(Ok::<_, DbError>)))
        .try_flatten()
        .boxed()
    }
}
