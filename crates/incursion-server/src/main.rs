//! Server binary for the incursion tracker.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `incursion-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Open the store and run migrations
//! 4. Start the read API on a background task
//! 5. Start the reconciliation scheduler (unless disabled)
//! 6. Wait for Ctrl-C, let both tasks finish, close the store

mod error;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use incursion_api::{AppState, ServerConfig, spawn_api};
use incursion_core::{Reconciler, TrackerConfig, TrackerContext, init_tracing, run_scheduler};
use incursion_esi::EsiClient;

use crate::error::TrackerError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if startup fails or a background task dies.
#[tokio::main]
async fn main() -> Result<(), TrackerError> {
    // 1-2. Configuration, then logging at the configured level.
    let config = TrackerConfig::load()?;
    init_tracing(&config.logging);
    info!(
        database = %config.database.url,
        feed = %config.feed.base_url,
        reconcile_enabled = config.reconcile.enabled,
        interval_secs = config.reconcile.interval_secs,
        strict = config.reconcile.strict,
        "incursion-server starting"
    );

    // 3. Store.
    let ctx = Arc::new(TrackerContext::open(config.clone()).await?);
    info!("Store opened");

    let (stop_tx, stop_rx) = watch::channel(false);

    // 4. Read API.
    let state = Arc::new(AppState::new(Arc::clone(&ctx)));
    let (addr, api) = spawn_api(
        &ServerConfig::from(&config.server),
        state,
        stopped(stop_rx.clone()),
    )
    .await?;
    info!(%addr, "Read API started");

    // 5. Scheduler.
    let scheduler = if config.reconcile.enabled {
        let reconciler = Reconciler::new(Arc::clone(&ctx), EsiClient::new(&config.feed)?);
        let interval = config.reconcile.interval();
        let stop = stopped(stop_rx);
        Some(tokio::spawn(async move {
            run_scheduler(&reconciler, interval, stop).await
        }))
    } else {
        info!("Reconciliation disabled, serving the store read-only");
        None
    };

    // 6. Shutdown.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    stop_tx.send_replace(true);

    if let Some(handle) = scheduler {
        let summary = handle.await.map_err(|e| TrackerError::Task {
            message: format!("scheduler: {e}"),
        })?;
        info!(
            cycles = summary.cycles,
            failures = summary.failures,
            "Scheduler finished"
        );
    }
    api.await.map_err(|e| TrackerError::Task {
        message: format!("read API: {e}"),
    })?;

    ctx.close().await;
    info!("incursion-server stopped");
    Ok(())
}

/// Resolves once the stop flag is raised (or its sender is gone).
async fn stopped(mut rx: watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        tracing::debug!("Stop channel closed");
    }
}
