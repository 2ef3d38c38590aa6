//! Integration tests for the `incursion-esi` feed client.
//!
//! Each test serves canned responses from a local axum server on an
//! ephemeral port and points [`EsiClient`] at it.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use axum::Router;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::get;
use incursion_esi::{EsiClient, EsiConfig, FeedError, FeedSource};
use incursion_types::{ConstellationId, SolarSystemId};
use serde_json::{Value, json};
use std::collections::HashMap;

/// Serve `router` on an ephemeral port and return a client pointed at it.
async fn serve(router: Router) -> EsiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    EsiClient::new(&EsiConfig {
        base_url: format!("http://{addr}/latest"),
        timeout_secs: 5,
        ..EsiConfig::default()
    })
    .unwrap()
}

fn incursion_list() -> Value {
    json!([
        {
            "constellation_id": 20000001,
            "faction_id": 500019,
            "has_boss": true,
            "infested_solar_systems": [30000001, 30000002],
            "influence": 0.9,
            "staging_solar_system_id": 30000001,
            "state": "mobilizing",
            "type": "Incursion"
        },
        {
            "constellation_id": 20000042,
            "infested_solar_systems": [],
            "influence": 0.0,
            "staging_solar_system_id": 30000300,
            "state": "established"
        }
    ])
}

#[tokio::test]
async fn fetches_and_decodes_the_incursion_list() {
    let router = Router::new().route(
        "/latest/incursions/",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            if params.get("datasource").map(String::as_str) == Some("tranquility") {
                (StatusCode::OK, axum::Json(incursion_list()))
            } else {
                (StatusCode::BAD_REQUEST, axum::Json(json!({"error": "datasource"})))
            }
        }),
    );
    let client = serve(router).await;

    let incursions = client.fetch_incursions().await.unwrap();
    assert_eq!(incursions.len(), 2);
    assert_eq!(incursions[0].constellation_id, ConstellationId(20_000_001));
    assert_eq!(incursions[0].state, "mobilizing");
    assert!(incursions[0].has_boss);
    assert_eq!(incursions[0].staging_solar_system_id, SolarSystemId(30_000_001));
    assert_eq!(incursions[1].faction_id, None);
    assert!(!incursions[1].has_boss);
}

#[tokio::test]
async fn resolves_system_security() {
    let router = Router::new().route(
        "/latest/universe/systems/{id}/",
        get(|Path(id): Path<i64>| async move {
            axum::Json(json!({
                "system_id": id,
                "name": "Test",
                "security_status": -0.23,
            }))
        }),
    );
    let client = serve(router).await;

    let security = client.system_security(SolarSystemId(30_000_300)).await.unwrap();
    assert!((security - -0.23).abs() < 1e-9);
}

#[tokio::test]
async fn error_status_is_reported() {
    let router = Router::new().route(
        "/latest/incursions/",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down for maintenance") }),
    );
    let client = serve(router).await;

    let result = client.fetch_incursions().await;
    assert!(matches!(result, Err(FeedError::Status { status: 503, .. })));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let router = Router::new().route(
        "/latest/incursions/",
        get(|| async { axum::Json(json!({"not": "a list"})) }),
    );
    let client = serve(router).await;

    let result = client.fetch_incursions().await;
    assert!(matches!(result, Err(FeedError::Decode { .. })));
}

#[tokio::test]
async fn unreachable_feed_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = EsiClient::new(&EsiConfig {
        base_url: format!("http://{addr}"),
        timeout_secs: 2,
        ..EsiConfig::default()
    })
    .unwrap();

    let result = client.fetch_incursions().await;
    assert!(matches!(result, Err(FeedError::Transport { .. })));
}
