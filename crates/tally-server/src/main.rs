//! Tally server binary.
//!
//! Wires the configuration, the traffic store, and the HTTP API together
//! and runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tally-config.yaml` (or `TALLY_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Open the traffic store and ensure its schema
//! 4. Serve the HTTP API until `Ctrl-C`
//! 5. Close the store

mod config;
mod error;

use std::sync::Arc;

use tally_api::AppState;
use tally_db::TrafficDb;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::TallyConfig;
use crate::error::ServerError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, store initialization, or the HTTP
/// server fails.
#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Logging is not up yet, so a load failure is reported by the returned
    // error alone.
    let config = TallyConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        database_path = %config.storage.database_path.display(),
        host = config.server.host,
        port = config.server.port,
        auth_enabled = config.auth.api_token.is_some(),
        "tally-server starting"
    );

    let db = TrafficDb::open(config.storage.store_config()).await?;

    let state = Arc::new(AppState::new(db.clone(), config.auth.api_token));
    let served =
        tally_api::start_server(&config.server.server_config(), state, shutdown_signal()).await;

    db.close().await;
    served?;

    info!("tally-server shutdown complete");
    Ok(())
}

/// Resolves on `Ctrl-C`.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
