//! Axum router construction for the API.
//!
//! Assembles all routes into a single [`Router`] with CORS and request
//! tracing. Everything under `/api` passes through the bearer-token check;
//! `/health` does not.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /health` -- liveness and store readiness
/// - `POST /api/events` -- ingest one event
/// - `GET /api/events/latest` -- newest 100 events
/// - `GET /api/sites/{site_id}/events` -- events in a range
/// - `GET /api/sites/{site_id}/stats` -- summary statistics
/// - `GET /api/sites/{site_id}/daily-views` -- zero-filled daily series
/// - `GET /api/sites/{site_id}/referrers` -- referrer breakdown
/// - `GET /api/sites/{site_id}/paths` -- path breakdown
/// - `GET /api/sites/{site_id}/countries` -- country breakdown
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/events", post(handlers::ingest_event))
        .route("/events/latest", get(handlers::latest_events))
        .route("/sites/{site_id}/events", get(handlers::site_events))
        .route("/sites/{site_id}/stats", get(handlers::summary_stats))
        .route("/sites/{site_id}/daily-views", get(handlers::daily_views))
        .route("/sites/{site_id}/referrers", get(handlers::referrer_breakdown))
        .route("/sites/{site_id}/paths", get(handlers::path_breakdown))
        .route("/sites/{site_id}/countries", get(handlers::country_breakdown))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_token,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
