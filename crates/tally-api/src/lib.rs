//! HTTP ingest and reporting API for the Tally traffic store.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Ingest** (`POST /api/events`) appending one event per request
//! - **Reports** (`/api/sites/{site_id}/...`) for summary stats, daily
//!   views, and referrer, path, and country breakdowns
//! - **Export** (`GET /api/sites/{site_id}/events`) reading a range through
//!   the cursor-paged scanner
//! - **Health** (`GET /health`) reporting whether the store is open
//!
//! All semantics live in [`tally_db::TrafficDb`]; handlers only parse,
//! delegate, and serialize. `/api` routes require a bearer token when one
//! is configured.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServeError, ServerConfig, start_server};
pub use state::AppState;
