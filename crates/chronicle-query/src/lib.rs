//! HTTP query API for the Chronicle event archive.
//!
//! This crate provides an Axum server exposing read-only REST endpoints
//! over [`chronicle_store::EventArchive`]:
//!
//! - **Run discovery** (`/api/runs`) with per-run event counts
//! - **Filtered, paginated event queries** for a run
//! - **Single-event fetch** by ID
//! - **Causality-chain traversal** around an event, depth-bounded
//!
//! The layer is deliberately thin: request parameters are validated at the
//! boundary (negative limits rejected, traversal depth capped) and
//! everything else is delegated to the archive. The archive is stateless,
//! so the API can be queried while a writer is appending; a response may
//! simply miss the newest few events mid-write.
//!
//! # Modules
//!
//! - [`error`] -- [`QueryError`] and its HTTP response mapping
//! - [`handlers`] -- Endpoint handlers and parameter parsing
//! - [`router`] -- Route table and middleware assembly
//! - [`server`] -- TCP bind and serve lifecycle
//! - [`state`] -- Shared application state

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::QueryError;
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::AppState;
