//! Read-side views reconstructed from the projection and the ledger.
//!
//! Neither view writes. The live board is one join over active records and
//! their events; the timer board folds defeat events newest first and stops
//! reading once every tier's slots are filled.

use std::ops::ControlFlow;
use std::pin::pin;

use futures::{Stream, TryStreamExt};

use incursion_db::{
    DbError, DefeatScan, EventStore, IncursionStore, active_tier_counts, defeat_scan,
};
use incursion_ledger::{TimerFold, assemble_live};
use incursion_types::{IncursionId, LedgerEvent, LiveBoard, TimerBoard};

use crate::context::TrackerContext;
use crate::error::HistoryError;

/// Builds the live and recent-history views.
#[derive(Debug, Clone, Copy)]
pub struct HistoryReconstructor<'a> {
    ctx: &'a TrackerContext,
}

impl<'a> HistoryReconstructor<'a> {
    /// Create a reconstructor over a shared context.
    pub const fn new(ctx: &'a TrackerContext) -> Self {
        Self { ctx }
    }

    /// Every active incursion with its latest event per kind, keyed by
    /// location.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Store`] if the store cannot be read.
    pub async fn live_incursions(&self) -> Result<LiveBoard, HistoryError> {
        let rows = IncursionStore::new(self.ctx.store().pool())
            .live_rows()
            .await?;
        Ok(assemble_live(rows))
    }

    /// The most recent defeats per tier, capped by the configured capacity
    /// minus the incursions currently active in that tier.
    ///
    /// Tier counts and the defeat scan share one read transaction, so both
    /// see the same committed state. Defeat rows that do not decode are
    /// skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Store`] if the store cannot be queried.
    pub async fn recent_history(&self) -> Result<TimerBoard, HistoryError> {
        let capacity = self.ctx.config().timers.capacity();
        let mut tx = self.ctx.store().pool().begin().await.map_err(DbError::from)?;

        let active = active_tier_counts(&mut *tx).await?;
        let fold = TimerFold::new(&capacity, &active);
        let board = if fold.is_saturated() {
            tracing::debug!("Every tier is full of active incursions, ledger not read");
            fold.finish()
        } else {
            fill(fold, defeat_scan(&mut *tx)).await?
        };

        tx.commit().await.map_err(DbError::from)?;
        Ok(board)
    }

    /// Every event of one identity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Store`] if the store cannot be read.
    pub async fn timeline(&self, id: IncursionId) -> Result<Vec<LedgerEvent>, HistoryError> {
        Ok(EventStore::new(self.ctx.store().pool()).timeline(id).await?)
    }
}

/// Feed the defeat scan into the fold until it saturates or the ledger ends.
async fn fill(
    mut fold: TimerFold,
    scan: impl Stream<Item = Result<DefeatScan, DbError>>,
) -> Result<TimerBoard, HistoryError> {
    let mut scan = pin!(scan);
    while let Some(row) = scan.try_next().await? {
        let record = match row {
            DefeatScan::Decoded(record) => record,
            DefeatScan::Unreadable { incursion_id, reason } => {
                fold = fold.skip_unreadable(incursion_id, &reason);
                continue;
            }
        };
        match fold.step(record) {
            ControlFlow::Continue(next) => fold = next,
            ControlFlow::Break(board) => return Ok(board),
        }
    }

    tracing::debug!(
        skipped = fold.skipped(),
        "Ledger exhausted before every tier filled"
    );
    Ok(fold.finish())
}
