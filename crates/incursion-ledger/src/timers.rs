//! Recent-history (timer) reconstruction as a fold over defeat events.
//!
//! The store streams defeat events newest first. [`TimerFold`] consumes them
//! one at a time, carrying the remaining capacity per tier and the entries
//! emitted so far. Each [`TimerFold::step`] takes the accumulator by value
//! and either continues with the next one or breaks with the finished board
//! once every tier is full, so the caller stops pulling from the stream.
//!
//! ```text
//! remaining = capacity - active (per tier, floored at 0)
//! for event in defeats (newest first):
//!     row unreadable         -> skip
//!     tier unresolved        -> skip
//!     remaining[tier] == 0   -> skip
//!     else                   -> emit, remaining[tier] -= 1
//!     all remaining == 0     -> stop
//! ```

use std::ops::ControlFlow;

use chrono::{DateTime, Utc};

use incursion_types::{
    ConstellationId, IncursionId, PerTier, SecurityTier, TimerBoard, TimerEntry,
};

/// Default per-tier capacity: high 1, low 1, null-security 3.
pub const DEFAULT_CAPACITY: PerTier<usize> = PerTier::new(1, 1, 3);

/// A defeat event joined with whatever the projection knows about it.
///
/// Both location and tier are optional: the row may have no incursion record
/// or a malformed tier, and such rows are skipped rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefeatRecord {
    /// Identity of the defeated incursion.
    pub incursion_id: IncursionId,
    /// Location key, if the incursion record exists.
    pub constellation_id: Option<ConstellationId>,
    /// Tier, if the incursion record exists and its tier parses.
    pub tier: Option<SecurityTier>,
    /// When the defeat was recorded.
    pub defeated_at: DateTime<Utc>,
}

/// Accumulator for the timer view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFold {
    remaining: PerTier<usize>,
    board: TimerBoard,
    skipped: usize,
}

impl TimerFold {
    /// Start a fold with `capacity - active` slots per tier.
    pub fn new(capacity: &PerTier<usize>, active: &PerTier<usize>) -> Self {
        Self {
            remaining: capacity.saturating_sub(active),
            board: TimerBoard::default(),
            skipped: 0,
        }
    }

    /// Slots still open per tier.
    pub const fn remaining(&self) -> &PerTier<usize> {
        &self.remaining
    }

    /// Number of events skipped for an unresolved tier or an unreadable row.
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Whether no tier can take another entry.
    pub const fn is_saturated(&self) -> bool {
        self.remaining.all_zero()
    }

    /// Consume one defeat event.
    ///
    /// Events must arrive newest first; the order within each tier of the
    /// finished board is the arrival order.
    pub fn step(mut self, record: DefeatRecord) -> ControlFlow<TimerBoard, Self> {
        match (record.constellation_id, record.tier) {
            (Some(constellation_id), Some(tier)) => {
                let slots = self.remaining.get_mut(tier);
                if *slots > 0 {
                    *slots = slots.saturating_sub(1);
                    self.board.get_mut(tier).push(TimerEntry::defeated(
                        record.incursion_id,
                        constellation_id,
                        tier,
                        record.defeated_at,
                    ));
                }
            }
            _ => {
                tracing::warn!(
                    incursion_id = %record.incursion_id,
                    defeated_at = %record.defeated_at,
                    "Skipping defeat event with unresolved tier"
                );
                self.skipped = self.skipped.saturating_add(1);
            }
        }

        if self.is_saturated() {
            ControlFlow::Break(self.board)
        } else {
            ControlFlow::Continue(self)
        }
    }

    /// Count a defeat row the store could not decode and move on.
    ///
    /// Remaining capacity is untouched, so the next readable defeat can
    /// still take the slot.
    pub fn skip_unreadable(mut self, incursion_id: Option<IncursionId>, reason: &str) -> Self {
        tracing::warn!(
            incursion_id = incursion_id.map(tracing::field::display),
            reason,
            "Skipping unreadable defeat event"
        );
        self.skipped = self.skipped.saturating_add(1);
        self
    }

    /// Finish early (ledger exhausted) and return the board.
    pub fn finish(self) -> TimerBoard {
        self.board
    }
}

/// Run the whole fold over an iterator of defeat events, newest first.
///
/// Pulls nothing when every tier is already saturated by live incursions,
/// and stops pulling as soon as the last slot is filled.
pub fn fold_timers(
    capacity: &PerTier<usize>,
    active: &PerTier<usize>,
    defeats: impl IntoIterator<Item = DefeatRecord>,
) -> TimerBoard {
    let mut fold = TimerFold::new(capacity, active);
    if fold.is_saturated() {
        return fold.finish();
    }
    for record in defeats {
        match fold.step(record) {
            ControlFlow::Continue(next) => fold = next,
            ControlFlow::Break(board) => return board,
        }
    }
    fold.finish()
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects, clippy::panic)]
mod tests {
    use std::cell::Cell;

    use chrono::TimeDelta;

    use super::*;

    /// Defeats spaced one hour apart, newest first.
    fn defeats(tiers: &[Option<SecurityTier>]) -> Vec<DefeatRecord> {
        let start = Utc::now();
        tiers
            .iter()
            .enumerate()
            .map(|(i, tier)| DefeatRecord {
                incursion_id: IncursionId::new(),
                constellation_id: Some(ConstellationId(i64::try_from(i).unwrap_or(0))),
                tier: *tier,
                defeated_at: start - TimeDelta::hours(i64::try_from(i).unwrap_or(0)),
            })
            .collect()
    }

    #[test]
    fn three_null_defeats_fill_null_tier_newest_first() {
        let input = defeats(&[
            Some(SecurityTier::Null),
            Some(SecurityTier::Null),
            Some(SecurityTier::Null),
            Some(SecurityTier::Null),
        ]);
        let board = fold_timers(&DEFAULT_CAPACITY, &PerTier::default(), input.clone());

        assert_eq!(board.null.len(), 3);
        assert_eq!(board.null[0].incursion_id, input[0].incursion_id);
        assert_eq!(board.null[2].incursion_id, input[2].incursion_id);
        assert!(board.null.windows(2).all(|w| w[0].time >= w[1].time));
        assert!(board.high.is_empty());
        assert!(board.low.is_empty());
    }

    #[test]
    fn active_incursions_consume_capacity() {
        let input = defeats(&[
            Some(SecurityTier::High),
            Some(SecurityTier::Null),
            Some(SecurityTier::Null),
            Some(SecurityTier::Null),
        ]);
        let active = PerTier::new(1, 0, 2);
        let board = fold_timers(&DEFAULT_CAPACITY, &active, input);

        assert!(board.high.is_empty());
        assert_eq!(board.null.len(), 1);
    }

    #[test]
    fn unresolved_tier_is_skipped_not_fatal() {
        let mut input = defeats(&[None, Some(SecurityTier::Low)]);
        input[0].constellation_id = None;

        let mut fold = TimerFold::new(&DEFAULT_CAPACITY, &PerTier::default());
        for record in input {
            match fold.step(record) {
                ControlFlow::Continue(next) => fold = next,
                ControlFlow::Break(_) => panic!("fold should not saturate here"),
            }
        }
        assert_eq!(fold.skipped(), 1);
        let board = fold.finish();
        assert_eq!(board.low.len(), 1);
    }

    #[test]
    fn unreadable_row_is_counted_and_keeps_capacity() {
        let fold = TimerFold::new(&DEFAULT_CAPACITY, &PerTier::default())
            .skip_unreadable(Some(IncursionId::new()), "bad time")
            .skip_unreadable(None, "bad identity");
        assert_eq!(fold.skipped(), 2);
        assert_eq!(fold.remaining(), &DEFAULT_CAPACITY);

        let record = defeats(&[Some(SecurityTier::High)]).remove(0);
        let ControlFlow::Continue(fold) = fold.step(record) else {
            panic!("fold should not saturate here");
        };
        assert_eq!(fold.finish().high.len(), 1);
    }

    #[test]
    fn scan_stops_once_every_tier_is_full() {
        let pulled = Cell::new(0_usize);
        let input = defeats(&[
            Some(SecurityTier::High),
            Some(SecurityTier::Low),
            Some(SecurityTier::Null),
            Some(SecurityTier::Null),
            Some(SecurityTier::Null),
            Some(SecurityTier::High),
            Some(SecurityTier::Low),
        ]);
        let counted = input.into_iter().inspect(|_| pulled.set(pulled.get() + 1));

        let board = fold_timers(&DEFAULT_CAPACITY, &PerTier::default(), counted);

        assert_eq!(pulled.get(), 5);
        assert_eq!(board.high.len(), 1);
        assert_eq!(board.low.len(), 1);
        assert_eq!(board.null.len(), 3);
    }

    #[test]
    fn saturated_start_pulls_nothing() {
        let pulled = Cell::new(0_usize);
        let input = defeats(&[Some(SecurityTier::High)]);
        let counted = input.into_iter().inspect(|_| pulled.set(pulled.get() + 1));

        let active = PerTier::new(2, 1, 5);
        let board = fold_timers(&DEFAULT_CAPACITY, &active, counted);

        assert_eq!(pulled.get(), 0);
        assert_eq!(board, TimerBoard::default());
    }

    #[test]
    fn counts_never_exceed_remaining_capacity() {
        let tiers: Vec<Option<SecurityTier>> = SecurityTier::ALL
            .iter()
            .copied()
            .map(Some)
            .cycle()
            .take(30)
            .collect();
        for active in [PerTier::new(0, 0, 0), PerTier::new(1, 0, 1), PerTier::new(0, 3, 2)] {
            let board = fold_timers(&DEFAULT_CAPACITY, &active, defeats(&tiers));
            let limit = DEFAULT_CAPACITY.saturating_sub(&active);
            for (tier, entries) in board.iter() {
                assert!(entries.len() <= *limit.get(tier));
                assert!(entries.iter().all(|e| e.tier == tier));
            }
        }
    }
}
