//! Integration tests for the query API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Each test seeds a temporary data directory
//! through a real synchronous writer, so the full file-backed read path is
//! exercised.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chronicle_query::router::build_router;
use chronicle_query::state::AppState;
use chronicle_store::{EventWriter, WriteMode, WriterConfig};
use chronicle_types::{ActorId, EventBuilder, EventId, MilestoneType, RunId};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Seeded fixture: one run with a milestone, a decision, an action caused
/// by the decision, and a detail event that default verbosity filters out
/// at write time.
struct Fixture {
    _dir: tempfile::TempDir,
    state: Arc<AppState>,
    run_id: RunId,
    actor: ActorId,
    decision_id: EventId,
    action_id: EventId,
}

fn make_fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let run_id = RunId::new();
    let writer = EventWriter::new(WriterConfig::new(
        dir.path(),
        run_id,
        WriteMode::Synchronous,
    ))
    .unwrap();

    let actor = ActorId::new();
    let mut builder = EventBuilder::new(run_id);
    builder.begin_turn(1);
    writer.emit(builder.milestone(MilestoneType::TurnStart).build());

    let decision = builder
        .decision(actor, "pick_trade_partner", None, Some(json!("m-42")))
        .summary("chose partner m-42")
        .build();
    let decision_id = decision.id;
    writer.emit(decision);

    builder.begin_turn(2);
    let action = builder
        .action(actor, "execute_trade", BTreeMap::new())
        .caused_by([decision_id])
        .build();
    let action_id = action.id;
    writer.emit(action);

    // Filtered out by the writer's default ACTION verbosity.
    writer.emit(builder.detail("price_curve", BTreeMap::new()).build());

    let state = Arc::new(AppState::new(dir.path().to_path_buf()));
    Fixture {
        _dir: dir,
        state,
        run_id,
        actor,
        decision_id,
        action_id,
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(fixture: &Fixture, uri: &str) -> (StatusCode, Value) {
    let router = build_router(Arc::clone(&fixture.state));
    let response = router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let json = body_to_json(response.into_body()).await;
    (status, json)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn index_describes_the_service() {
    let fixture = make_fixture();
    let (status, json) = get(&fixture, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["service"], "chronicle-query");
}

#[tokio::test]
async fn list_runs_returns_counts() {
    let fixture = make_fixture();
    let (status, json) = get(&fixture, "/api/runs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["runs"][0]["run_id"], fixture.run_id.to_string());
    // The detail event was filtered at write time: 3 lines on disk.
    assert_eq!(json["runs"][0]["event_count"], 3);
}

#[tokio::test]
async fn list_events_returns_ordered_page() {
    let fixture = make_fixture();
    let uri = format!("/api/runs/{}/events", fixture.run_id);
    let (status, json) = get(&fixture, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 3);
    assert_eq!(json["has_more"], false);
    let events = json["events"].as_array().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["kind"], "milestone");
    assert_eq!(events[1]["kind"], "decision");
    assert_eq!(events[2]["kind"], "action");
}

#[tokio::test]
async fn kind_and_actor_filters_apply() {
    let fixture = make_fixture();

    let uri = format!("/api/runs/{}/events?kind=decision", fixture.run_id);
    let (status, json) = get(&fixture, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 1);
    assert_eq!(json["events"][0]["decision_type"], "pick_trade_partner");

    let uri = format!(
        "/api/runs/{}/events?actor_id={}",
        fixture.run_id, fixture.actor
    );
    let (_, json) = get(&fixture, &uri).await;
    // The milestone carries no actor and is excluded.
    assert_eq!(json["total"], 2);

    let uri = format!("/api/runs/{}/events?from_turn=2", fixture.run_id);
    let (_, json) = get(&fixture, &uri).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["events"][0]["kind"], "action");
}

#[tokio::test]
async fn pagination_reports_has_more() {
    let fixture = make_fixture();
    let uri = format!("/api/runs/{}/events?limit=2", fixture.run_id);
    let (status, json) = get(&fixture, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["events"].as_array().unwrap().len(), 2);
    assert_eq!(json["total"], 3);
    assert_eq!(json["has_more"], true);

    let uri = format!("/api/runs/{}/events?limit=2&offset=2", fixture.run_id);
    let (_, json) = get(&fixture, &uri).await;
    assert_eq!(json["events"].as_array().unwrap().len(), 1);
    assert_eq!(json["has_more"], false);
}

#[tokio::test]
async fn invalid_parameters_are_rejected_with_400() {
    let fixture = make_fixture();

    let uri = format!("/api/runs/{}/events?limit=-1", fixture.run_id);
    let (status, json) = get(&fixture, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("limit"));

    let uri = format!("/api/runs/{}/events?kind=bogus", fixture.run_id);
    let (status, _) = get(&fixture, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&fixture, "/api/runs/not-a-uuid/events").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_run_and_event_return_404() {
    let fixture = make_fixture();

    let uri = format!("/api/runs/{}/events", RunId::new());
    let (status, _) = get(&fixture, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!(
        "/api/runs/{}/events/{}",
        fixture.run_id,
        EventId::new()
    );
    let (status, _) = get(&fixture, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn fetch_single_event_by_id() {
    let fixture = make_fixture();
    let uri = format!(
        "/api/runs/{}/events/{}",
        fixture.run_id, fixture.decision_id
    );
    let (status, json) = get(&fixture, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], fixture.decision_id.to_string());
    assert_eq!(json["kind"], "decision");
}

#[tokio::test]
async fn causality_endpoint_links_both_directions() {
    let fixture = make_fixture();

    let uri = format!(
        "/api/runs/{}/events/{}/causality",
        fixture.run_id, fixture.action_id
    );
    let (status, json) = get(&fixture, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let upstream = json["upstream"].as_array().unwrap();
    assert_eq!(upstream.len(), 1);
    assert_eq!(upstream[0]["id"], fixture.decision_id.to_string());
    assert!(json["downstream"].as_array().unwrap().is_empty());

    let uri = format!(
        "/api/runs/{}/events/{}/causality",
        fixture.run_id, fixture.decision_id
    );
    let (_, json) = get(&fixture, &uri).await;
    let downstream = json["downstream"].as_array().unwrap();
    assert_eq!(downstream.len(), 1);
    assert_eq!(downstream[0]["id"], fixture.action_id.to_string());
}

#[tokio::test]
async fn causality_depth_is_validated() {
    let fixture = make_fixture();

    let uri = format!(
        "/api/runs/{}/events/{}/causality?depth=33",
        fixture.run_id, fixture.action_id
    );
    let (status, _) = get(&fixture, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!(
        "/api/runs/{}/events/{}/causality?depth=-2",
        fixture.run_id, fixture.action_id
    );
    let (status, _) = get(&fixture, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
