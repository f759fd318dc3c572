//! Shared application state for the API server.

use tally_db::TrafficDb;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Handle to the traffic store.
    pub db: TrafficDb,
    /// Bearer token required on `/api` routes. `None` disables the check.
    pub api_token: Option<String>,
}

impl AppState {
    /// Create state around an existing store handle.
    ///
    /// A blank token is treated as no token.
    pub fn new(db: TrafficDb, api_token: Option<String>) -> Self {
        Self {
            db,
            api_token: api_token.filter(|token| !token.trim().is_empty()),
        }
    }
}
