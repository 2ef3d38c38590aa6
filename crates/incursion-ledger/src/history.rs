//! Live-view assembly from joined projection and ledger rows.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Utc};

use incursion_types::{
    ConstellationId, EventKind, IncursionId, IncursionState, LiveBoard, LiveIncursion,
    SecurityTier,
};

/// One row of `active incursion LEFT JOIN its ledger events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRow {
    /// Identity.
    pub incursion_id: IncursionId,
    /// Location key.
    pub constellation_id: ConstellationId,
    /// Current state.
    pub state: IncursionState,
    /// Boss flag.
    pub has_boss: bool,
    /// Tier, if recorded.
    pub tier: Option<SecurityTier>,
    /// The joined event, absent when the incursion has none.
    pub event: Option<(EventKind, DateTime<Utc>)>,
}

/// Fold joined rows into the live board.
///
/// Rows for the same incursion are merged; when a label recurs the later
/// timestamp wins regardless of row order.
pub fn assemble_live(rows: impl IntoIterator<Item = LiveRow>) -> LiveBoard {
    let mut board: LiveBoard = BTreeMap::new();

    for row in rows {
        let incursion = board
            .entry(row.constellation_id)
            .or_insert_with(|| LiveIncursion {
                incursion_id: row.incursion_id,
                constellation_id: row.constellation_id,
                tier: row.tier,
                state: row.state,
                has_boss: row.has_boss,
                history: BTreeMap::new(),
            });

        let Some((kind, at)) = row.event else {
            continue;
        };
        match incursion.history.entry(kind) {
            Entry::Vacant(slot) => {
                slot.insert(at);
            }
            Entry::Occupied(mut slot) => {
                if at > *slot.get() {
                    slot.insert(at);
                }
            }
        }
    }

    board
}
