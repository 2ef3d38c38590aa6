//! Read API for the incursion tracker.
//!
//! This crate provides an Axum HTTP server that exposes the live board and
//! the recent-history timers reconstructed from the ledger:
//!
//! - **`GET /`** and **`GET /api/incursions`** -- live incursions keyed by
//!   constellation
//! - **`GET /api/timers`** -- recently defeated incursions per tier
//! - **`GET /api/health`** -- liveness and live count
//!
//! # Architecture
//!
//! Every request reads the store through
//! [`HistoryReconstructor`](incursion_core::HistoryReconstructor); the API
//! never writes. The reconciler runs elsewhere (the server binary's
//! scheduler or the one-shot updater) against the same store.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, bind, start_server};
pub use startup::{StartupError, spawn_api};
pub use state::AppState;
