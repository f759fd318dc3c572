//! Store lifecycle: open, close, and the shared store handle.
//!
//! [`TrafficDb`] is the one handle every consumer receives. It is cheap to
//! clone and holds the connection pool only while the store is open, so
//! "not initialized" is an ordinary [`DbError::NotInitialized`] instead of
//! a crash. Every operation resolves the pool first.
//!
//! The lock around the pool is held just long enough to clone the pool
//! handle. Write ordering is left to `SQLite`.
//!
//! # Restore
//!
//! Replacing the database file (restore from a backup) is done as
//! [`TrafficDb::close`], swap the file, [`TrafficDb::initialize`]. Requests
//! issued in between fail with [`DbError::NotInitialized`]. The caller must
//! keep other work off the store for the duration; nothing here blocks it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, TryStreamExt};
use sqlx::SqlitePool;
use tally_types::{
    BreakdownRow, DailyCount, SiteId, SummaryReport, TimeRange, TrafficEvent, TrafficEventInput,
};
use tokio::sync::RwLock;

use crate::cursor::EventCursor;
use crate::error::DbError;
use crate::event_store::EventStore;
use crate::report_store::ReportStore;
use crate::schema::ensure_schema;
use crate::sqlite::{StoreConfig, open_pool};

/// Shared handle to the traffic store.
#[derive(Debug, Clone)]
pub struct TrafficDb {
    config: Arc<StoreConfig>,
    pool: Arc<RwLock<Option<SqlitePool>>>,
}

impl TrafficDb {
    /// Create a closed store handle. Call [`TrafficDb::initialize`] before
    /// use.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config: Arc::new(config),
            pool: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a handle and open it in one step.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StoreInit`] if the store cannot be opened.
    pub async fn open(config: StoreConfig) -> Result<Self, DbError> {
        let db = Self::new(config);
        db.initialize().await?;
        Ok(db)
    }

    /// The configuration this handle was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open the database file and ensure the schema exists.
    ///
    /// Calling this on an open store does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StoreInit`] if the file cannot be opened or the
    /// schema cannot be created.
    pub async fn initialize(&self) -> Result<(), DbError> {
        let mut slot = self.pool.write().await;
        if slot.is_some() {
            return Ok(());
        }

        let pool = open_pool(&self.config).await.map_err(DbError::init)?;
        if let Err(e) = ensure_schema(&pool).await {
            pool.close().await;
            return Err(DbError::init(e));
        }

        *slot = Some(pool);
        tracing::info!(path = %self.config.path.display(), "Traffic store initialized");
        Ok(())
    }

    /// Close the pool. Safe to call repeatedly and on a store that was
    /// never opened.
    pub async fn close(&self) {
        let pool = self.pool.write().await.take();
        if let Some(pool) = pool {
            pool.close().await;
            tracing::info!("Traffic store closed");
        }
    }

    /// Whether the store is currently open.
    pub async fn is_initialized(&self) -> bool {
        self.pool.read().await.is_some()
    }

    /// A clone of the open pool.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`] if the store is closed.
    pub async fn pool(&self) -> Result<SqlitePool, DbError> {
        self.pool
            .read()
            .await
            .as_ref()
            .filter(|pool| !pool.is_closed())
            .cloned()
            .ok_or(DbError::NotInitialized)
    }

    /// Event store bound to the open pool.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`] if the store is closed.
    pub async fn events(&self) -> Result<EventStore, DbError> {
        Ok(EventStore::new(self.pool().await?))
    }

    /// Report store bound to the open pool.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`] if the store is closed.
    pub async fn reports(&self) -> Result<ReportStore, DbError> {
        Ok(ReportStore::new(self.pool().await?))
    }

    // -----------------------------------------------------------------------
    // Ingest
    // -----------------------------------------------------------------------

    /// Append one event ingested now and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`], [`DbError::InvalidEvent`], or
    /// [`DbError::StoreIo`].
    pub async fn append(&self, input: &TrafficEventInput) -> Result<i64, DbError> {
        self.append_at(input, Utc::now()).await
    }

    /// Append one event with an explicit ingestion time (backfill, replay).
    ///
    /// # Errors
    ///
    /// Same as [`TrafficDb::append`].
    pub async fn append_at(
        &self,
        input: &TrafficEventInput,
        ingested_at: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        self.events().await?.append(input, ingested_at).await
    }

    // -----------------------------------------------------------------------
    // Streaming reads
    // -----------------------------------------------------------------------

    /// Pull-based cursor over one site's events in `range`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`] or [`DbError::InvalidQuery`].
    pub async fn cursor(
        &self,
        site_id: &SiteId,
        range: TimeRange,
        batch_size: usize,
    ) -> Result<EventCursor, DbError> {
        EventCursor::new(self.pool().await?, site_id.clone(), range, batch_size)
    }

    /// Lazy stream of one site's events in `range`, ascending by id.
    ///
    /// `batch_size` defaults to the configured batch size.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`] or [`DbError::InvalidQuery`]
    /// before any row is read. Storage faults during the scan are yielded
    /// by the stream and end it.
    pub async fn stream_events(
        &self,
        site_id: &SiteId,
        range: TimeRange,
        batch_size: Option<usize>,
    ) -> Result<BoxStream<'static, Result<TrafficEvent, DbError>>, DbError> {
        let batch_size = batch_size.unwrap_or(self.config.batch_size);
        Ok(self.cursor(site_id, range, batch_size).await?.into_stream())
    }

    /// Every event of [`TrafficDb::stream_events`], collected in order.
    ///
    /// # Errors
    ///
    /// Same as [`TrafficDb::stream_events`], plus the first error the scan
    /// hits.
    pub async fn query_events(
        &self,
        site_id: &SiteId,
        range: TimeRange,
        batch_size: Option<usize>,
    ) -> Result<Vec<TrafficEvent>, DbError> {
        self.stream_events(site_id, range, batch_size)
            .await?
            .try_collect()
            .await
    }

    /// The 100 newest events, optionally for one site.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`] or [`DbError::StoreIo`].
    pub async fn latest_events(
        &self,
        site_id: Option<&SiteId>,
    ) -> Result<Vec<TrafficEvent>, DbError> {
        self.events().await?.latest(site_id).await
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    /// See [`ReportStore::summary_stats`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`] or [`DbError::StoreIo`].
    pub async fn summary_stats(
        &self,
        site_id: &SiteId,
        range: TimeRange,
    ) -> Result<SummaryReport, DbError> {
        self.reports().await?.summary_stats(site_id, range).await
    }

    /// See [`ReportStore::daily_views`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`], [`DbError::InvalidQuery`], or
    /// [`DbError::StoreIo`].
    pub async fn daily_views(
        &self,
        site_id: &SiteId,
        range: TimeRange,
    ) -> Result<Vec<DailyCount>, DbError> {
        self.reports().await?.daily_views(site_id, range).await
    }

    /// See [`ReportStore::daily_views_by_path`].
    ///
    /// # Errors
    ///
    /// Same as [`TrafficDb::daily_views`].
    pub async fn daily_views_by_path(
        &self,
        site_id: &SiteId,
        range: TimeRange,
        path: &str,
    ) -> Result<Vec<DailyCount>, DbError> {
        self.reports()
            .await?
            .daily_views_by_path(site_id, range, path)
            .await
    }

    /// See [`ReportStore::referrer_breakdown`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`] or [`DbError::StoreIo`].
    pub async fn referrer_breakdown(
        &self,
        site_id: &SiteId,
        range: TimeRange,
    ) -> Result<Vec<BreakdownRow>, DbError> {
        self.reports().await?.referrer_breakdown(site_id, range).await
    }

    /// See [`ReportStore::path_breakdown`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`] or [`DbError::StoreIo`].
    pub async fn path_breakdown(
        &self,
        site_id: &SiteId,
        range: TimeRange,
    ) -> Result<Vec<BreakdownRow>, DbError> {
        self.reports().await?.path_breakdown(site_id, range).await
    }

    /// See [`ReportStore::country_breakdown`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotInitialized`] or [`DbError::StoreIo`].
    pub async fn country_breakdown(
        &self,
        site_id: &SiteId,
        range: TimeRange,
    ) -> Result<Vec<BreakdownRow>, DbError> {
        self.reports().await?.country_breakdown(site_id, range).await
    }
}
