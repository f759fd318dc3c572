//! Read-only aggregation queries over the event log.
//!
//! Every report is a pure function of `(site, time range)`. Ranges are
//! inclusive millisecond bounds on the event `timestamp`, except for the
//! daily series, which bucket by ingestion day (`created_at`) over the
//! calendar days the range spans. Callers relying on that split must not
//! assume both report families filter on the same clock.
//!
//! No report treats an empty result as an error: totals come back as
//! zero, lists come back empty, and daily series still carry one zeroed
//! row per day.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;
use tally_types::labels::{
    DIRECT_REFERRER, MAX_DAILY_SPAN_DAYS, NO_PATH, REQUEST_TYPE_API, REQUEST_TYPE_STATIC,
    TOP_REFERRER_LIMIT, UNKNOWN_COUNTRY,
};
use tally_types::{BreakdownRow, DailyCount, ReferrerCount, SiteId, SummaryReport, TimeRange};

use crate::error::DbError;
use crate::spine::{date_spine, zero_fill};

/// The attribute a breakdown groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// Group by `referrer`; missing values become `"(direct)"`.
    Referrer,
    /// Group by `path`; missing values become `"(no path)"`.
    Path,
    /// Group by `country`; missing values become `"(unknown)"`.
    Country,
}

impl Dimension {
    /// Column name in `traffic_events`.
    const fn column(self) -> &'static str {
        match self {
            Self::Referrer => "referrer",
            Self::Path => "path",
            Self::Country => "country",
        }
    }

    /// Label substituted for `NULL` values.
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Referrer => DIRECT_REFERRER,
            Self::Path => NO_PATH,
            Self::Country => UNKNOWN_COUNTRY,
        }
    }
}

/// Aggregation queries on the `traffic_events` table.
#[derive(Debug, Clone)]
pub struct ReportStore {
    pool: SqlitePool,
}

impl ReportStore {
    /// Create a report store bound to a connection pool.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Totals, unique visitors, request classes, and top referrers.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StoreIo`] if a query fails.
    pub async fn summary_stats(
        &self,
        site_id: &SiteId,
        range: TimeRange,
    ) -> Result<SummaryReport, DbError> {
        let (total_requests, unique_visitors, total_website_requests, total_server_requests): (
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r"SELECT COUNT(*),
                     COUNT(DISTINCT ip_address),
                     COALESCE(SUM(CASE WHEN request_type = ?4 OR request_type IS NULL THEN 1 ELSE 0 END), 0),
                     COALESCE(SUM(CASE WHEN request_type = ?5 THEN 1 ELSE 0 END), 0)
              FROM traffic_events
              WHERE site_id = ?1 AND timestamp BETWEEN ?2 AND ?3",
        )
        .bind(site_id.as_str())
        .bind(range.start())
        .bind(range.end())
        .bind(REQUEST_TYPE_STATIC)
        .bind(REQUEST_TYPE_API)
        .fetch_one(&self.pool)
        .await?;

        let top_referrers: Vec<(String, i64)> = sqlx::query_as(
            r"SELECT COALESCE(referrer, ?4) AS label, COUNT(*) AS count
              FROM traffic_events
              WHERE site_id = ?1 AND timestamp BETWEEN ?2 AND ?3
              GROUP BY label
              ORDER BY count DESC, label ASC
              LIMIT ?5",
        )
        .bind(site_id.as_str())
        .bind(range.start())
        .bind(range.end())
        .bind(DIRECT_REFERRER)
        .bind(TOP_REFERRER_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(SummaryReport {
            total_requests,
            unique_visitors,
            total_website_requests,
            total_server_requests,
            top_referrers: top_referrers
                .into_iter()
                .map(|(referrer, count)| ReferrerCount { referrer, count })
                .collect(),
        })
    }

    /// Events per ingestion day for every day the range spans.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidQuery`] if a bound is outside the
    /// supported date range or the range spans more than
    /// [`MAX_DAILY_SPAN_DAYS`] days, or [`DbError::StoreIo`] if the query
    /// fails.
    pub async fn daily_views(
        &self,
        site_id: &SiteId,
        range: TimeRange,
    ) -> Result<Vec<DailyCount>, DbError> {
        self.daily_series(site_id, range, None).await
    }

    /// Like [`ReportStore::daily_views`], restricted to one path.
    ///
    /// # Errors
    ///
    /// Same as [`ReportStore::daily_views`].
    pub async fn daily_views_by_path(
        &self,
        site_id: &SiteId,
        range: TimeRange,
        path: &str,
    ) -> Result<Vec<DailyCount>, DbError> {
        self.daily_series(site_id, range, Some(path)).await
    }

    async fn daily_series(
        &self,
        site_id: &SiteId,
        range: TimeRange,
        path: Option<&str>,
    ) -> Result<Vec<DailyCount>, DbError> {
        let (first_day, last_day) = day_bounds(range)?;
        check_daily_span(first_day, last_day)?;
        let spine = date_spine(first_day, last_day);
        let (from_secs, to_secs) = day_span_seconds(first_day, last_day)?;

        let rows: Vec<(String, i64)> = sqlx::query_as(
            r"SELECT date(created_at, 'unixepoch') AS day, COUNT(*) AS count
              FROM traffic_events
              WHERE site_id = ?1
                AND created_at BETWEEN ?2 AND ?3
                AND (?4 IS NULL OR path = ?4)
              GROUP BY day",
        )
        .bind(site_id.as_str())
        .bind(from_secs)
        .bind(to_secs)
        .bind(path)
        .fetch_all(&self.pool)
        .await?;

        let counts: BTreeMap<String, i64> = rows.into_iter().collect();
        Ok(zero_fill(&spine, &counts))
    }

    /// Referrer share of matching events.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StoreIo`] if the query fails.
    pub async fn referrer_breakdown(
        &self,
        site_id: &SiteId,
        range: TimeRange,
    ) -> Result<Vec<BreakdownRow>, DbError> {
        self.breakdown(site_id, range, Dimension::Referrer).await
    }

    /// Path share of matching events.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StoreIo`] if the query fails.
    pub async fn path_breakdown(
        &self,
        site_id: &SiteId,
        range: TimeRange,
    ) -> Result<Vec<BreakdownRow>, DbError> {
        self.breakdown(site_id, range, Dimension::Path).await
    }

    /// Country share of matching events.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StoreIo`] if the query fails.
    pub async fn country_breakdown(
        &self,
        site_id: &SiteId,
        range: TimeRange,
    ) -> Result<Vec<BreakdownRow>, DbError> {
        self.breakdown(site_id, range, Dimension::Country).await
    }

    /// Group matching events by `dimension`, with each bucket's count and
    /// its percentage of the total rounded to two decimals.
    ///
    /// Ordered by count descending, then by key. Returns an empty list when
    /// nothing matches; the `NULLIF` keeps the division defined.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StoreIo`] if the query fails.
    pub async fn breakdown(
        &self,
        site_id: &SiteId,
        range: TimeRange,
        dimension: Dimension,
    ) -> Result<Vec<BreakdownRow>, DbError> {
        let sql = format!(
            r"SELECT COALESCE({column}, ?4) AS label,
                     COUNT(*) AS count,
                     ROUND(COUNT(*) * 100.0 / NULLIF(
                         (SELECT COUNT(*) FROM traffic_events
                          WHERE site_id = ?1 AND timestamp BETWEEN ?2 AND ?3), 0), 2) AS percentage
              FROM traffic_events
              WHERE site_id = ?1 AND timestamp BETWEEN ?2 AND ?3
              GROUP BY label
              ORDER BY count DESC, label ASC",
            column = dimension.column(),
        );

        let rows: Vec<(String, i64, Option<f64>)> = sqlx::query_as(&sql)
            .bind(site_id.as_str())
            .bind(range.start())
            .bind(range.end())
            .bind(dimension.placeholder())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(key, count, percentage)| BreakdownRow {
                key,
                count,
                percentage: percentage.unwrap_or_default(),
            })
            .collect())
    }
}

/// First and last UTC calendar day covered by `range`.
fn day_bounds(range: TimeRange) -> Result<(NaiveDate, NaiveDate), DbError> {
    match (range.start_date(), range.end_date()) {
        (Some(first), Some(last)) => Ok((first, last)),
        _ => Err(DbError::InvalidQuery(format!(
            "time range {}..{} is outside the supported date range",
            range.start(),
            range.end()
        ))),
    }
}

/// Reject series longer than [`MAX_DAILY_SPAN_DAYS`] days.
fn check_daily_span(first: NaiveDate, last: NaiveDate) -> Result<(), DbError> {
    // Inclusive day count is span + 1.
    if last.signed_duration_since(first).num_days() >= MAX_DAILY_SPAN_DAYS {
        return Err(DbError::InvalidQuery(format!(
            "daily series from {first} to {last} exceeds {MAX_DAILY_SPAN_DAYS} days"
        )));
    }
    Ok(())
}

/// `created_at` bounds, in seconds, covering `first` 00:00:00 through
/// `last` 23:59:59 UTC.
fn day_span_seconds(first: NaiveDate, last: NaiveDate) -> Result<(i64, i64), DbError> {
    let from = first.and_time(NaiveTime::MIN).and_utc().timestamp();
    let to = last
        .and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| DbError::InvalidQuery(format!("no end of day for {last}")))?;
    Ok((from, to))
}
