//! Shared application state for the query API server.
//!
//! [`AppState`] holds the event archive the REST endpoints read from. The
//! archive itself is stateless -- every request re-scans the run directory
//! -- so the state carries no locks and no caches, and requests never
//! contend with each other or with an in-progress writer.

use std::path::PathBuf;

use chronicle_store::EventArchive;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Read-only access to every run under the data root.
    pub archive: EventArchive,
}

impl AppState {
    /// Create application state over the given data root.
    pub const fn new(data_dir: PathBuf) -> Self {
        Self {
            archive: EventArchive::new(data_dir),
        }
    }
}
