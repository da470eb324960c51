//! REST API endpoint handlers for the query server.
//!
//! All handlers validate their parameters at the boundary, then delegate to
//! the [`EventArchive`](chronicle_store::EventArchive) via the shared
//! [`AppState`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Service descriptor with endpoint list |
//! | `GET` | `/api/runs` | List runs with event counts |
//! | `GET` | `/api/runs/{run_id}/events` | Filtered, paginated events |
//! | `GET` | `/api/runs/{run_id}/events/{event_id}` | Single event |
//! | `GET` | `/api/runs/{run_id}/events/{event_id}/causality` | Causal chain |

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use chronicle_types::{ActorId, EventId, EventKind, FilterCriteria, RunId};

use crate::error::QueryError;
use crate::state::AppState;

/// Largest page size a request may ask for; bigger limits are clamped.
const MAX_LIMIT: usize = 1_000;

/// Hard ceiling on causality traversal depth; deeper requests are rejected.
const MAX_DEPTH: usize = 32;

/// Traversal depth when the request does not specify one.
const DEFAULT_DEPTH: usize = 5;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the events listing endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Comma-separated event kinds (e.g. `decision,action`).
    pub kind: Option<String>,
    /// Comma-separated actor UUIDs.
    pub actor_id: Option<String>,
    /// Earliest turn to include (inclusive).
    pub from_turn: Option<u64>,
    /// Turn upper bound (exclusive).
    pub to_turn: Option<u64>,
    /// Earliest timestamp to include (inclusive, RFC 3339).
    pub from_ts: Option<DateTime<Utc>>,
    /// Timestamp upper bound (exclusive, RFC 3339).
    pub to_ts: Option<DateTime<Utc>>,
    /// Maximum number of events to return (default 100, max 1000).
    ///
    /// Signed on purpose: a negative value must reach the validator so it
    /// can be rejected with a clear message rather than a generic 400.
    pub limit: Option<i64>,
    /// Number of matching events to skip (default 0).
    pub offset: Option<i64>,
}

/// Query parameters for the causality endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct CausalityQuery {
    /// Maximum traversal depth in each direction (default 5, max 32).
    pub depth: Option<i64>,
}

// ---------------------------------------------------------------------------
// GET / -- service descriptor
// ---------------------------------------------------------------------------

/// Describe the service and its endpoints.
pub async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "chronicle-query",
        "endpoints": [
            "/api/runs",
            "/api/runs/{run_id}/events",
            "/api/runs/{run_id}/events/{event_id}",
            "/api/runs/{run_id}/events/{event_id}/causality",
        ],
    }))
}

// ---------------------------------------------------------------------------
// GET /api/runs -- list runs
// ---------------------------------------------------------------------------

/// List every run under the data root with its event count.
pub async fn list_runs(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, QueryError> {
    let runs = state.archive.list_runs().await?;
    Ok(Json(serde_json::json!({
        "count": runs.len(),
        "runs": runs,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/runs/{run_id}/events -- filtered, paginated events
// ---------------------------------------------------------------------------

/// Query a run's events with filtering and pagination.
///
/// Returns `{events, total, has_more}` where `total` counts all matching
/// events across pages.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, QueryError> {
    let run_id = parse_run_id(&run_id)?;
    let criteria = build_criteria(&params)?;
    let page = state.archive.query(run_id, &criteria).await?;
    Ok(Json(page))
}

// ---------------------------------------------------------------------------
// GET /api/runs/{run_id}/events/{event_id} -- single event
// ---------------------------------------------------------------------------

/// Fetch one event by ID.
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path((run_id, event_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, QueryError> {
    let run_id = parse_run_id(&run_id)?;
    let event_id = parse_event_id(&event_id)?;
    let event = state
        .archive
        .get_event(run_id, event_id)
        .await?
        .ok_or_else(|| QueryError::NotFound(format!("event {event_id}")))?;
    Ok(Json(event))
}

// ---------------------------------------------------------------------------
// GET /api/runs/{run_id}/events/{event_id}/causality -- causal chain
// ---------------------------------------------------------------------------

/// Walk the causality chain around an event.
///
/// Returns `{upstream, downstream}`, each sorted oldest-first and bounded
/// by the requested depth.
pub async fn get_causality(
    State(state): State<Arc<AppState>>,
    Path((run_id, event_id)): Path<(String, String)>,
    Query(params): Query<CausalityQuery>,
) -> Result<impl IntoResponse, QueryError> {
    let run_id = parse_run_id(&run_id)?;
    let event_id = parse_event_id(&event_id)?;
    let depth = validate_depth(params.depth)?;
    let chain = state
        .archive
        .causality(run_id, event_id, depth)
        .await?
        .ok_or_else(|| QueryError::NotFound(format!("event {event_id}")))?;
    Ok(Json(chain))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Translate request parameters into filter criteria, rejecting anything
/// malformed before the archive is touched.
fn build_criteria(params: &EventsQuery) -> Result<FilterCriteria, QueryError> {
    let mut criteria = FilterCriteria::default();

    if let Some(ref raw) = params.kind {
        let mut kinds = BTreeSet::new();
        for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let kind = EventKind::from_name(name).ok_or_else(|| {
                QueryError::InvalidQuery(format!("unknown event kind: {name}"))
            })?;
            kinds.insert(kind);
        }
        if !kinds.is_empty() {
            criteria.kinds = Some(kinds);
        }
    }

    if let Some(ref raw) = params.actor_id {
        let mut actors = BTreeSet::new();
        for token in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let actor = token
                .parse::<ActorId>()
                .map_err(|err| QueryError::InvalidUuid(format!("{token}: {err}")))?;
            actors.insert(actor);
        }
        if !actors.is_empty() {
            criteria.actors = Some(actors);
        }
    }

    criteria.from_turn = params.from_turn;
    criteria.to_turn = params.to_turn;
    criteria.from_ts = params.from_ts;
    criteria.to_ts = params.to_ts;

    if let Some(limit) = params.limit {
        if limit <= 0 {
            return Err(QueryError::InvalidQuery(format!(
                "limit must be positive, got {limit}"
            )));
        }
        criteria.limit = usize::try_from(limit).unwrap_or(MAX_LIMIT).min(MAX_LIMIT);
    }
    if let Some(offset) = params.offset {
        if offset < 0 {
            return Err(QueryError::InvalidQuery(format!(
                "offset must be non-negative, got {offset}"
            )));
        }
        criteria.offset = usize::try_from(offset).unwrap_or(usize::MAX);
    }

    Ok(criteria)
}

/// Validate a requested traversal depth against the fixed ceiling.
fn validate_depth(raw: Option<i64>) -> Result<usize, QueryError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_DEPTH);
    };
    let depth = usize::try_from(raw).map_err(|_| {
        QueryError::InvalidQuery(format!("depth must be positive, got {raw}"))
    })?;
    if depth == 0 {
        return Err(QueryError::InvalidQuery(
            "depth must be positive, got 0".to_owned(),
        ));
    }
    if depth > MAX_DEPTH {
        return Err(QueryError::InvalidQuery(format!(
            "depth {depth} exceeds maximum {MAX_DEPTH}"
        )));
    }
    Ok(depth)
}

/// Parse a run ID from a path segment.
fn parse_run_id(raw: &str) -> Result<RunId, QueryError> {
    raw.parse()
        .map_err(|err| QueryError::InvalidUuid(format!("{raw}: {err}")))
}

/// Parse an event ID from a path segment.
fn parse_event_id(raw: &str) -> Result<EventId, QueryError> {
    raw.parse()
        .map_err(|err| QueryError::InvalidUuid(format!("{raw}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_params() -> EventsQuery {
        EventsQuery {
            kind: None,
            actor_id: None,
            from_turn: None,
            to_turn: None,
            from_ts: None,
            to_ts: None,
            limit: None,
            offset: None,
        }
    }

    #[test]
    fn negative_limit_is_rejected() {
        let params = EventsQuery {
            limit: Some(-5),
            ..empty_params()
        };
        assert!(matches!(
            build_criteria(&params),
            Err(QueryError::InvalidQuery(_))
        ));
    }

    #[test]
    fn oversized_limit_is_clamped() {
        let params = EventsQuery {
            limit: Some(1_000_000),
            ..empty_params()
        };
        let criteria = build_criteria(&params).ok();
        assert_eq!(criteria.map(|c| c.limit), Some(MAX_LIMIT));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let params = EventsQuery {
            kind: Some("decision,banana".to_owned()),
            ..empty_params()
        };
        assert!(matches!(
            build_criteria(&params),
            Err(QueryError::InvalidQuery(_))
        ));
    }

    #[test]
    fn depth_ceiling_is_enforced() {
        assert!(validate_depth(Some(33)).is_err());
        assert!(validate_depth(Some(-1)).is_err());
        assert!(validate_depth(Some(0)).is_err());
        assert_eq!(validate_depth(Some(32)).ok(), Some(32));
        assert_eq!(validate_depth(None).ok(), Some(DEFAULT_DEPTH));
    }
}
