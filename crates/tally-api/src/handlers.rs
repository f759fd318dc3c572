//! REST handlers for ingest and reporting.
//!
//! Each handler parses its inputs, delegates to [`TrafficDb`], and wraps
//! the result in JSON. Range parameters `start` and `end` are millisecond
//! timestamps and both are required on the per-site routes.
//!
//! [`TrafficDb`]: tally_db::TrafficDb

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use tally_types::{SiteId, TimeRange, TrafficEventInput};

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Query parameters shared by the report routes.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    /// Inclusive lower bound, ms since epoch.
    pub start: Option<i64>,
    /// Inclusive upper bound, ms since epoch.
    pub end: Option<i64>,
}

/// Query parameters for `GET /api/sites/{site_id}/events`.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Inclusive lower bound, ms since epoch.
    pub start: Option<i64>,
    /// Inclusive upper bound, ms since epoch.
    pub end: Option<i64>,
    /// Rows fetched per round trip. Defaults to the store setting.
    pub batch_size: Option<usize>,
}

/// Query parameters for `GET /api/sites/{site_id}/daily-views`.
#[derive(Debug, Default, Deserialize)]
pub struct DailyViewsQuery {
    /// Inclusive lower bound, ms since epoch.
    pub start: Option<i64>,
    /// Inclusive upper bound, ms since epoch.
    pub end: Option<i64>,
    /// Restrict the series to one path.
    pub path: Option<String>,
}

/// Query parameters for `GET /api/events/latest`.
#[derive(Debug, Default, Deserialize)]
pub struct LatestQuery {
    /// Restrict to one site.
    pub site_id: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness plus store readiness. `503` while the store is closed.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let initialized = state.db.is_initialized().await;
    let status = if initialized {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(serde_json::json!({
            "status": if initialized { "ok" } else { "unavailable" },
            "initialized": initialized,
        })),
    )
}

// ---------------------------------------------------------------------------
// POST /api/events
// ---------------------------------------------------------------------------

/// Record one traffic event. Responds `201 {"id": n}`.
pub async fn ingest_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TrafficEventInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload.map_err(|e| ApiError::InvalidEvent(e.body_text()))?;
    let id = state.db.append(&input).await?;
    tracing::debug!(id, site_id = %input.site_id, "Event ingested");
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

// ---------------------------------------------------------------------------
// GET /api/events/latest
// ---------------------------------------------------------------------------

/// The 100 newest events, optionally for one site.
pub async fn latest_events(
    State(state): State<Arc<AppState>>,
    params: Result<Query<LatestQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(query_rejection)?;
    let site_id = params
        .site_id
        .map(SiteId::from)
        .filter(|site| !site.is_blank());

    let events = state.db.latest_events(site_id.as_ref()).await?;
    Ok(Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/sites/{site_id}/events
// ---------------------------------------------------------------------------

/// Every event of a site in the range, ascending by id.
pub async fn site_events(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<String>,
    params: Result<Query<EventsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(query_rejection)?;
    let range = time_range(params.start, params.end)?;
    let site_id = SiteId::from(site_id);

    let events = state
        .db
        .query_events(&site_id, range, params.batch_size)
        .await?;
    Ok(Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/sites/{site_id}/stats
// ---------------------------------------------------------------------------

/// Summary statistics for a site.
pub async fn summary_stats(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<String>,
    params: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(query_rejection)?;
    let range = time_range(params.start, params.end)?;
    let report = state
        .db
        .summary_stats(&SiteId::from(site_id), range)
        .await?;
    Ok(Json(report))
}

// ---------------------------------------------------------------------------
// GET /api/sites/{site_id}/daily-views
// ---------------------------------------------------------------------------

/// Zero-filled views per ingestion day, optionally for one path.
pub async fn daily_views(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<String>,
    params: Result<Query<DailyViewsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(query_rejection)?;
    let range = time_range(params.start, params.end)?;
    let site_id = SiteId::from(site_id);

    let days = match params.path.as_deref() {
        Some(path) => state.db.daily_views_by_path(&site_id, range, path).await?,
        None => state.db.daily_views(&site_id, range).await?,
    };
    Ok(Json(serde_json::json!({
        "count": days.len(),
        "days": days,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/sites/{site_id}/{referrers,paths,countries}
// ---------------------------------------------------------------------------

/// Referrer breakdown for a site.
pub async fn referrer_breakdown(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<String>,
    params: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(query_rejection)?;
    let range = time_range(params.start, params.end)?;
    let rows = state
        .db
        .referrer_breakdown(&SiteId::from(site_id), range)
        .await?;
    Ok(Json(serde_json::json!({ "count": rows.len(), "rows": rows })))
}

/// Path breakdown for a site.
pub async fn path_breakdown(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<String>,
    params: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(query_rejection)?;
    let range = time_range(params.start, params.end)?;
    let rows = state
        .db
        .path_breakdown(&SiteId::from(site_id), range)
        .await?;
    Ok(Json(serde_json::json!({ "count": rows.len(), "rows": rows })))
}

/// Country breakdown for a site.
pub async fn country_breakdown(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<String>,
    params: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(query_rejection)?;
    let range = time_range(params.start, params.end)?;
    let rows = state
        .db
        .country_breakdown(&SiteId::from(site_id), range)
        .await?;
    Ok(Json(serde_json::json!({ "count": rows.len(), "rows": rows })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a [`TimeRange`] from required `start`/`end` parameters.
fn time_range(start: Option<i64>, end: Option<i64>) -> Result<TimeRange, ApiError> {
    let (Some(start), Some(end)) = (start, end) else {
        return Err(ApiError::InvalidQuery(String::from(
            "start and end are required",
        )));
    };
    TimeRange::new(start, end).ok_or_else(|| {
        ApiError::InvalidQuery(format!("start ({start}) is after end ({end})"))
    })
}

#[allow(clippy::needless_pass_by_value)]
fn query_rejection(rejection: QueryRejection) -> ApiError {
    ApiError::InvalidQuery(rejection.body_text())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn time_range_requires_both_bounds() {
        assert!(time_range(None, Some(1)).is_err());
        assert!(time_range(Some(1), None).is_err());
        assert!(time_range(Some(5), Some(1)).is_err());

        let range = time_range(Some(1), Some(1)).unwrap();
        assert_eq!((range.start(), range.end()), (1, 1));
    }
}
