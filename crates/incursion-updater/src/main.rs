//! One-shot reconciliation for cron-style scheduling.
//!
//! Runs exactly one cycle against the configured store and feed, then
//! exits. The exit status is non-zero when the cycle was aborted or any
//! plan item failed to persist.

use std::sync::Arc;

use anyhow::{Context, ensure};
use tracing::info;

use incursion_core::{Reconciler, TrackerConfig, TrackerContext, init_tracing};
use incursion_esi::EsiClient;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if startup fails, the cycle aborts, or an item fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = TrackerConfig::load().context("loading configuration")?;
    init_tracing(&config.logging);
    info!(database = %config.database.url, "incursion-updater starting");

    let feed = EsiClient::new(&config.feed).context("building feed client")?;
    let ctx = Arc::new(
        TrackerContext::open(config)
            .await
            .context("opening store")?,
    );

    let result = Reconciler::new(Arc::clone(&ctx), feed).run_cycle().await;
    ctx.close().await;

    let report = result.context("reconciliation cycle aborted")?;
    ensure!(
        report.failed == 0,
        "{} plan items failed to persist",
        report.failed
    );
    Ok(())
}
