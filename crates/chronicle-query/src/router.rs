//! Axum router construction for the query API.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled so browser-based analysis tools can query runs cross-origin.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the query server.
///
/// The router includes:
/// - `GET /` -- service descriptor
/// - `GET /api/runs` -- list runs with event counts
/// - `GET /api/runs/{run_id}/events` -- filtered, paginated events
/// - `GET /api/runs/{run_id}/events/{event_id}` -- single event
/// - `GET /api/runs/{run_id}/events/{event_id}/causality` -- causal chain
///
/// CORS is configured to allow any origin for development. In production
/// this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/runs", get(handlers::list_runs))
        .route("/api/runs/{run_id}/events", get(handlers::list_events))
        .route(
            "/api/runs/{run_id}/events/{event_id}",
            get(handlers::get_event),
        )
        .route(
            "/api/runs/{run_id}/events/{event_id}/causality",
            get(handlers::get_causality),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
