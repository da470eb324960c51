//! Query server binary for the Chronicle event streaming subsystem.
//!
//! Serves the read-only HTTP API over a data directory of run event files.
//! The writer side lives in the host simulation process; this binary only
//! ever reads, so it can run alongside an in-progress simulation.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `chronicle-config.yaml` (or defaults)
//! 3. Build the application state over the data directory
//! 4. Serve the query API until terminated

mod config;
mod error;

use std::path::Path;
use std::sync::Arc;

use chronicle_query::{start_server, AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::QuerydConfig;
use crate::error::QuerydError;

/// Application entry point for the query server.
///
/// # Errors
///
/// Returns an error if configuration loading or the server itself fails.
#[tokio::main]
async fn main() -> Result<(), QuerydError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("chronicle-queryd starting");

    // 2. Load configuration.
    let config_path = std::env::var("CHRONICLE_CONFIG")
        .unwrap_or_else(|_| String::from("chronicle-config.yaml"));
    let config = QuerydConfig::load(Path::new(&config_path))?;
    info!(
        data_dir = %config.data_dir.display(),
        host = config.server.host,
        port = config.server.port,
        "configuration loaded"
    );

    // 3. Build application state.
    let state = Arc::new(AppState::new(config.data_dir));

    // 4. Serve until terminated.
    let server_config = ServerConfig {
        host: config.server.host,
        port: config.server.port,
    };
    start_server(&server_config, state).await?;

    Ok(())
}
