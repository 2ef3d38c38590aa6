//! Integration tests for the read API endpoints.
//!
//! Most tests drive the `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. The store is an in-memory `SQLite` database seeded
//! through the same persistence calls the reconciler uses.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use incursion_api::{AppState, ServerConfig, build_router, spawn_api};
use incursion_core::{ManualClock, TrackerConfig, TrackerContext};
use incursion_db::{SqliteStore, persist_defeat, persist_establishment};
use incursion_ledger::{Defeat, Establishment, Sighting};
use incursion_types::{
    ConstellationId, IncursionId, IncursionRecord, IncursionState, SecurityTier, SolarSystemId,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

async fn empty_state() -> Arc<AppState> {
    let store = SqliteStore::in_memory().await.unwrap();
    let ctx = TrackerContext::from_parts(
        store,
        Arc::new(ManualClock::new(t0())),
        TrackerConfig::default(),
    );
    Arc::new(AppState::new(Arc::new(ctx)))
}

async fn establish(
    state: &AppState,
    constellation: i64,
    tier: SecurityTier,
    has_boss: bool,
    at: DateTime<Utc>,
) -> IncursionRecord {
    let establishment = Establishment::new(
        Sighting {
            constellation_id: ConstellationId(constellation),
            state: IncursionState::Established,
            has_boss,
            staging_system_id: SolarSystemId(30_000_000 + constellation),
        },
        tier,
    );
    persist_establishment(state.context().store().pool(), &establishment, at)
        .await
        .unwrap()
}

async fn defeat(state: &AppState, id: IncursionId, constellation: i64, at: DateTime<Utc>) {
    let defeat = Defeat {
        incursion_id: id,
        constellation_id: ConstellationId(constellation),
    };
    persist_defeat(state.context().store().pool(), &defeat, at)
        .await
        .unwrap();
}

/// One live high-sec incursion with a boss, one defeated null-sec.
async fn seeded_state() -> (Arc<AppState>, IncursionRecord) {
    let state = empty_state().await;
    let live = establish(&state, 123, SecurityTier::High, true, t0()).await;
    let gone = establish(&state, 456, SecurityTier::Null, false, t0()).await;
    defeat(&state, gone.id, 456, t0() + TimeDelta::minutes(30)).await;
    (state, live)
}

async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let response = build_router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =========================================================================
// Live view
// =========================================================================

#[tokio::test]
async fn root_serves_live_board_keyed_by_constellation() {
    let (state, live) = seeded_state().await;

    let (status, json) = get(state, "/").await;
    assert_eq!(status, StatusCode::OK);

    let board = json.as_object().unwrap();
    assert_eq!(board.len(), 1);
    let entry = &json["123"];
    assert_eq!(entry["uuid"], live.id.to_string());
    assert_eq!(entry["constellation_id"], 123);
    assert_eq!(entry["state"], "established");
    assert_eq!(entry["has_boss"], true);
    assert_eq!(entry["tier"], "high");
    assert!(entry["history"]["established"].is_string());
    assert!(entry["history"]["boss"].is_string());
}

#[tokio::test]
async fn api_incursions_matches_root() {
    let (state, _) = seeded_state().await;

    let (_, root) = get(Arc::clone(&state), "/").await;
    let (status, api) = get(state, "/api/incursions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(root, api);
}

#[tokio::test]
async fn empty_store_serves_empty_board() {
    let state = empty_state().await;
    let (status, json) = get(state, "/api/incursions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({}));
}

// =========================================================================
// Timers
// =========================================================================

#[tokio::test]
async fn timers_list_recent_defeats_per_tier() {
    let (state, _) = seeded_state().await;

    let (status, json) = get(state, "/api/timers").await;
    assert_eq!(status, StatusCode::OK);

    // The live high-sec incursion uses up the only high slot.
    assert_eq!(json["high"], serde_json::json!([]));
    assert_eq!(json["low"], serde_json::json!([]));

    let null = json["null"].as_array().unwrap();
    assert_eq!(null.len(), 1);
    assert_eq!(null[0]["constellation_id"], 456);
    assert_eq!(null[0]["tier"], "null");
    assert!(null[0]["time"].is_string());
    assert_eq!(null[0]["history"]["defeated"], null[0]["time"]);
}

// =========================================================================
// Health and errors
// =========================================================================

#[tokio::test]
async fn health_reports_live_count() {
    let (state, _) = seeded_state().await;
    let (status, json) = get(state, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["live"], 1);
}

#[tokio::test]
async fn closed_store_is_a_json_500() {
    let state = empty_state().await;
    state.context().close().await;

    let (status, json) = get(state, "/api/timers").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], 500);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let state = empty_state().await;
    let response = build_router(state)
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let state = empty_state().await;
    let response = build_router(state)
        .oneshot(
            Request::get("/api/health")
                .header("origin", "https://example.org")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}

// =========================================================================
// Server lifecycle
// =========================================================================

#[tokio::test]
async fn spawned_api_serves_until_shutdown() {
    let (state, _) = seeded_state().await;
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let config = ServerConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
    };

    let (addr, handle) = spawn_api(&config, state, async {
        let _ = rx.await;
    })
    .await
    .unwrap();

    let json: Value = reqwest::get(format!("http://{addr}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["live"], 1);

    tx.send(()).unwrap();
    handle.await.unwrap();
}
