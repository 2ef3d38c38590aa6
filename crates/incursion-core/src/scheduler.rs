//! Periodic reconciliation loop.
//!
//! [`run_scheduler`] runs one cycle per interval until the shutdown future
//! resolves. Cycles never overlap: a slow cycle delays the next tick rather
//! than queueing a burst. Shutdown is only observed between cycles, so a
//! cycle in progress always finishes its writes.

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use incursion_esi::FeedSource;

use crate::reconciler::Reconciler;

/// Totals for one scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerSummary {
    /// Cycles that completed.
    pub cycles: u64,
    /// Cycles aborted by a feed, store or strict-mode error.
    pub failures: u64,
}

/// Run reconciliation cycles every `interval` until `shutdown` resolves.
///
/// The first cycle runs immediately. A failed cycle is logged and retried
/// on the next tick.
pub async fn run_scheduler<F, S>(
    reconciler: &Reconciler<F>,
    interval: Duration,
    shutdown: S,
) -> SchedulerSummary
where
    F: FeedSource,
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shutdown = pin!(shutdown);
    let mut summary = SchedulerSummary::default();

    tracing::info!(interval_secs = interval.as_secs(), "Reconciliation scheduler started");

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        match reconciler.run_cycle().await {
            Ok(report) => {
                summary.cycles = summary.cycles.saturating_add(1);
                if report.is_noop() {
                    tracing::debug!(skipped = report.skipped, "Cycle made no changes");
                }
            }
            Err(e) => {
                summary.failures = summary.failures.saturating_add(1);
                tracing::error!(error = %e, "Reconciliation cycle failed, retrying next interval");
            }
        }
    }

    tracing::info!(
        cycles = summary.cycles,
        failures = summary.failures,
        "Reconciliation scheduler stopped"
    );
    summary
}
