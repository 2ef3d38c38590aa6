//! The reconciliation cycle: feed snapshot in, ledger appends out.
//!
//! # Cycle
//!
//! ```text
//! 1. fetch feed snapshot          (failure aborts, nothing written)
//! 2. read live set
//! 3. plan: arrivals / updates / defeats / skipped
//! 4. classify arrivals by staging-system security
//! 5. strict mode: any fatal skip aborts, nothing written
//! 6. apply each item in its own transaction
//!        failure -> logged, counted, next item
//! ```
//!
//! A cycle never runs concurrently with another on the same store; the
//! scheduler runs them back to back.

use std::sync::Arc;

use serde::Serialize;

use incursion_db::{IncursionStore, persist_defeat, persist_establishment, persist_update};
use incursion_esi::FeedSource;
use incursion_ledger::{Defeat, Establishment, Skip, SkipReason, Update, plan};
use incursion_types::{SecurityTier, SolarSystemId};

use crate::context::TrackerContext;
use crate::error::ReconcileError;

/// What one cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// New incursions established.
    pub established: usize,
    /// Live incursions whose state changed.
    pub transitioned: usize,
    /// Boss events appended (on establishment or update).
    pub boss_marked: usize,
    /// Incursions concluded.
    pub defeated: usize,
    /// Feed entries not acted on.
    pub skipped: usize,
    /// Plan items whose transaction failed.
    pub failed: usize,
}

impl CycleReport {
    /// Whether the cycle wrote nothing.
    pub const fn is_noop(&self) -> bool {
        self.established == 0 && self.transitioned == 0 && self.boss_marked == 0 && self.defeated == 0
    }
}

fn bump(counter: &mut usize) {
    *counter = counter.saturating_add(1);
}

/// Runs reconciliation cycles against one feed.
pub struct Reconciler<F> {
    ctx: Arc<TrackerContext>,
    feed: F,
}

impl<F: FeedSource> Reconciler<F> {
    /// Create a reconciler over a shared context and a feed.
    pub const fn new(ctx: Arc<TrackerContext>, feed: F) -> Self {
        Self { ctx, feed }
    }

    /// The feed this reconciler reads.
    pub const fn feed(&self) -> &F {
        &self.feed
    }

    /// Run one full cycle.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Feed`] if the snapshot cannot be fetched,
    /// [`ReconcileError::Store`] if the live set cannot be read, or
    /// [`ReconcileError::FatalSkips`] in strict mode when any feed entry is
    /// unusable. In all three cases nothing has been written.
    pub async fn run_cycle(&self) -> Result<CycleReport, ReconcileError> {
        let snapshot = self.feed.fetch_incursions().await?;
        let pool = self.ctx.store().pool();
        let live = IncursionStore::new(pool).live().await?;

        let mut changes = plan(&snapshot, &live);

        let arrivals = std::mem::take(&mut changes.arrivals);
        let mut establishments = Vec::with_capacity(arrivals.len());
        for sighting in arrivals {
            match self.classify(sighting.staging_system_id).await {
                Ok(tier) => establishments.push(Establishment::new(sighting, tier)),
                Err(reason) => changes.skipped.push(Skip {
                    constellation_id: sighting.constellation_id,
                    reason,
                }),
            }
        }

        for skip in &changes.skipped {
            tracing::warn!(
                constellation_id = %skip.constellation_id,
                reason = %skip.reason,
                "Skipping feed entry"
            );
        }

        if self.ctx.config().reconcile.strict {
            let fatal: Vec<Skip> = changes.fatal_skips().cloned().collect();
            if !fatal.is_empty() {
                tracing::error!(
                    fatal = fatal.len(),
                    "Strict mode: aborting cycle before any write"
                );
                return Err(ReconcileError::FatalSkips(fatal));
            }
        }

        let mut report = CycleReport {
            skipped: changes.skipped.len(),
            ..CycleReport::default()
        };
        self.apply_establishments(&establishments, &mut report).await;
        self.apply_updates(&changes.updates, &mut report).await;
        self.apply_defeats(&changes.defeats, &mut report).await;

        tracing::info!(
            feed = snapshot.len(),
            established = report.established,
            transitioned = report.transitioned,
            boss_marked = report.boss_marked,
            defeated = report.defeated,
            skipped = report.skipped,
            failed = report.failed,
            "Reconciliation cycle complete"
        );

        Ok(report)
    }

    async fn apply_establishments(&self, establishments: &[Establishment], report: &mut CycleReport) {
        let pool = self.ctx.store().pool();
        for establishment in establishments {
            let now = self.ctx.clock().now();
            match persist_establishment(pool, establishment, now).await {
                Ok(record) => {
                    bump(&mut report.established);
                    if record.has_boss {
                        bump(&mut report.boss_marked);
                    }
                    tracing::info!(
                        incursion_id = %record.id,
                        constellation_id = %record.constellation_id,
                        state = %record.state,
                        tier = %establishment.tier,
                        "Incursion established"
                    );
                }
                Err(e) => {
                    bump(&mut report.failed);
                    tracing::error!(
                        incursion_id = %establishment.incursion_id,
                        constellation_id = %establishment.sighting.constellation_id,
                        error = %e,
                        "Failed to establish incursion"
                    );
                }
            }
        }
    }

    async fn apply_updates(&self, updates: &[Update], report: &mut CycleReport) {
        let pool = self.ctx.store().pool();
        for update in updates {
            let now = self.ctx.clock().now();
            match persist_update(pool, update, now).await {
                Ok(()) => {
                    if let Some(state) = update.new_state {
                        bump(&mut report.transitioned);
                        tracing::info!(
                            incursion_id = %update.incursion_id,
                            constellation_id = %update.constellation_id,
                            %state,
                            "Incursion changed state"
                        );
                    }
                    if update.mark_boss {
                        bump(&mut report.boss_marked);
                        tracing::info!(
                            incursion_id = %update.incursion_id,
                            constellation_id = %update.constellation_id,
                            "Boss spawned"
                        );
                    }
                }
                Err(e) => {
                    bump(&mut report.failed);
                    tracing::error!(
                        incursion_id = %update.incursion_id,
                        constellation_id = %update.constellation_id,
                        error = %e,
                        "Failed to update incursion"
                    );
                }
            }
        }
    }

    async fn apply_defeats(&self, defeats: &[Defeat], report: &mut CycleReport) {
        let pool = self.ctx.store().pool();
        for defeat in defeats {
            let now = self.ctx.clock().now();
            match persist_defeat(pool, defeat, now).await {
                Ok(defeated_at) => {
                    bump(&mut report.defeated);
                    tracing::info!(
                        incursion_id = %defeat.incursion_id,
                        constellation_id = %defeat.constellation_id,
                        %defeated_at,
                        "Incursion defeated"
                    );
                }
                Err(e) => {
                    bump(&mut report.failed);
                    tracing::error!(
                        incursion_id = %defeat.incursion_id,
                        constellation_id = %defeat.constellation_id,
                        error = %e,
                        "Failed to record defeat"
                    );
                }
            }
        }
    }

    /// Resolve and classify a staging system's security status.
    async fn classify(&self, system: SolarSystemId) -> Result<SecurityTier, SkipReason> {
        let security = self
            .feed
            .system_security(system)
            .await
            .map_err(|e| SkipReason::UnresolvedSecurity(e.to_string()))?;
        self.ctx
            .config()
            .security
            .classify(security)
            .map_err(|e| SkipReason::UnresolvedSecurity(e.to_string()))
    }
}
