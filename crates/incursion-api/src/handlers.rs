//! Endpoint handlers for the read API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Live incursions keyed by constellation |
//! | `GET` | `/api/incursions` | Same as `/` |
//! | `GET` | `/api/timers` | Recent defeats per tier |
//! | `GET` | `/api/health` | Liveness and live count |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use incursion_db::IncursionStore;
use incursion_types::{LiveBoard, TimerBoard};

use crate::error::ApiError;
use crate::state::AppState;

/// Every active incursion, keyed by constellation id.
pub async fn live_incursions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LiveBoard>, ApiError> {
    Ok(Json(state.history().live_incursions().await?))
}

/// Recently defeated incursions per tier, most recent first.
pub async fn timers(State(state): State<Arc<AppState>>) -> Result<Json<TimerBoard>, ApiError> {
    Ok(Json(state.history().recent_history().await?))
}

/// Body of `GET /api/health`.
#[derive(Debug, Serialize)]
pub struct Health {
    /// Always `"ok"` when the store answered.
    pub status: &'static str,
    /// Number of live incursions.
    pub live: usize,
}

/// Liveness check that also proves the store is readable.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Health>, ApiError> {
    let live = IncursionStore::new(state.context().store().pool())
        .live()
        .await?
        .len();
    Ok(Json(Health { status: "ok", live }))
}
