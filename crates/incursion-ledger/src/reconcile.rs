//! Reconciliation planning: diff a feed snapshot against the live set.
//!
//! [`plan`] is pure. It validates every feed entry into a [`Sighting`] or a
//! [`Skip`], then sorts the sightings into three buckets:
//!
//! ```text
//! feed key not live          -> arrival   (needs a tier, then establishment)
//! feed key live, differs     -> update    (state change and/or boss mark)
//! live key not in feed       -> defeat
//! ```
//!
//! A skipped entry still counts as present, so an unreadable sighting can
//! never turn into a false defeat. Applying the plan is the store's job;
//! every [`Establishment`], [`Update`] and [`Defeat`] touches exactly one
//! identity and is meant to be applied as one transaction.

use std::collections::{BTreeMap, BTreeSet};

use incursion_types::{
    ConstellationId, FeedIncursion, IncursionId, IncursionRecord, IncursionState, SecurityTier,
    SolarSystemId,
};

/// A validated feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sighting {
    /// Location key.
    pub constellation_id: ConstellationId,
    /// Reported state.
    pub state: IncursionState,
    /// Whether the boss is present.
    pub has_boss: bool,
    /// System used for tier classification.
    pub staging_system_id: SolarSystemId,
}

/// Why a feed entry was not acted on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    /// The state label is not one the feed is allowed to report.
    #[error("unknown state label {0:?}")]
    UnknownState(String),
    /// The location key already appeared earlier in the same snapshot.
    #[error("location reported more than once")]
    DuplicateLocation,
    /// The staging system's security status could not be resolved.
    #[error("security status unresolved: {0}")]
    UnresolvedSecurity(String),
}

impl SkipReason {
    /// Whether this skip should abort a strict cycle.
    ///
    /// A duplicate is harmless (the first occurrence was used); anything
    /// else means local state would silently diverge from the feed.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::DuplicateLocation)
    }
}

/// A feed entry that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    /// Location key of the skipped entry.
    pub constellation_id: ConstellationId,
    /// Why it was skipped.
    pub reason: SkipReason,
}

impl core::fmt::Display for Skip {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "constellation {}: {}", self.constellation_id, self.reason)
    }
}

/// A new incursion with its tier resolved, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Establishment {
    /// Identity assigned to the new incursion.
    pub incursion_id: IncursionId,
    /// The sighting that triggered it.
    pub sighting: Sighting,
    /// Tier, fixed from now on.
    pub tier: SecurityTier,
}

impl Establishment {
    /// Assign a fresh identity to a classified arrival.
    pub fn new(sighting: Sighting, tier: SecurityTier) -> Self {
        Self {
            incursion_id: IncursionId::new(),
            sighting,
            tier,
        }
    }
}

/// Changes to one live incursion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    /// Identity being updated.
    pub incursion_id: IncursionId,
    /// Location key.
    pub constellation_id: ConstellationId,
    /// New state, when it differs from the stored one.
    pub new_state: Option<IncursionState>,
    /// Whether the boss flag switches on.
    pub mark_boss: bool,
}

/// A live incursion the feed no longer reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defeat {
    /// Identity being concluded.
    pub incursion_id: IncursionId,
    /// Location key.
    pub constellation_id: ConstellationId,
}

/// Everything one reconciliation cycle has to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Sightings with no live record; each needs a tier before it can be
    /// established.
    pub arrivals: Vec<Sighting>,
    /// Live incursions whose state or boss flag changed.
    pub updates: Vec<Update>,
    /// Live incursions missing from the feed.
    pub defeats: Vec<Defeat>,
    /// Feed entries that were not acted on.
    pub skipped: Vec<Skip>,
}

impl ReconcilePlan {
    /// Whether the plan writes nothing.
    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty() && self.updates.is_empty() && self.defeats.is_empty()
    }

    /// Skips that abort a strict cycle.
    pub fn fatal_skips(&self) -> impl Iterator<Item = &Skip> {
        self.skipped.iter().filter(|s| s.reason.is_fatal())
    }
}

/// Validate one feed entry.
///
/// The feed only reports ongoing incursions, so `defeated` is rejected along
/// with any label that is not a state at all.
pub fn validate(entry: &FeedIncursion) -> Result<Sighting, Skip> {
    let state = match entry.state.parse::<IncursionState>() {
        Ok(IncursionState::Defeated) | Err(_) => {
            return Err(Skip {
                constellation_id: entry.constellation_id,
                reason: SkipReason::UnknownState(entry.state.clone()),
            });
        }
        Ok(state) => state,
    };
    Ok(Sighting {
        constellation_id: entry.constellation_id,
        state,
        has_boss: entry.has_boss,
        staging_system_id: entry.staging_solar_system_id,
    })
}

/// Diff a feed snapshot against the projection.
///
/// Inactive records in `live` are ignored. Arrivals and updates keep feed
/// order; defeats are ordered by location key.
pub fn plan(feed: &[FeedIncursion], live: &[IncursionRecord]) -> ReconcilePlan {
    let live_by_key: BTreeMap<ConstellationId, &IncursionRecord> = live
        .iter()
        .filter(|r| r.active)
        .map(|r| (r.constellation_id, r))
        .collect();

    let mut seen: BTreeSet<ConstellationId> = BTreeSet::new();
    let mut result = ReconcilePlan::default();

    for entry in feed {
        if !seen.insert(entry.constellation_id) {
            result.skipped.push(Skip {
                constellation_id: entry.constellation_id,
                reason: SkipReason::DuplicateLocation,
            });
            continue;
        }

        let sighting = match validate(entry) {
            Ok(sighting) => sighting,
            Err(skip) => {
                result.skipped.push(skip);
                continue;
            }
        };

        let Some(record) = live_by_key.get(&sighting.constellation_id) else {
            result.arrivals.push(sighting);
            continue;
        };

        let new_state = (record.state != sighting.state).then_some(sighting.state);
        if let Some(next) = new_state.filter(|n| !record.state.precedes(*n)) {
            tracing::warn!(
                incursion_id = %record.id,
                constellation_id = %record.constellation_id,
                from = %record.state,
                to = %next,
                "Out-of-order state transition reported by feed, recording as-is"
            );
        }
        let mark_boss = sighting.has_boss && !record.has_boss;

        if new_state.is_some() || mark_boss {
            result.updates.push(Update {
                incursion_id: record.id,
                constellation_id: record.constellation_id,
                new_state,
                mark_boss,
            });
        }
    }

    result.defeats = live_by_key
        .values()
        .filter(|r| !seen.contains(&r.constellation_id))
        .map(|r| Defeat {
            incursion_id: r.id,
            constellation_id: r.constellation_id,
        })
        .collect();

    result
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn feed(constellation: i64, state: &str, has_boss: bool) -> FeedIncursion {
        FeedIncursion {
            constellation_id: ConstellationId(constellation),
            state: state.to_owned(),
            has_boss,
            staging_solar_system_id: SolarSystemId(constellation.saturating_add(10_000)),
            infested_solar_systems: Vec::new(),
            influence: 0.0,
            faction_id: None,
            kind: None,
        }
    }

    fn live(constellation: i64, state: IncursionState, has_boss: bool) -> IncursionRecord {
        IncursionRecord {
            id: IncursionId::new(),
            constellation_id: ConstellationId(constellation),
            state,
            has_boss,
            tier: Some(SecurityTier::High),
            active: true,
            established_at: Utc::now(),
        }
    }

    #[test]
    fn unseen_location_is_an_arrival() {
        let result = plan(&[feed(123, "established", false)], &[]);
        assert_eq!(result.arrivals.len(), 1);
        assert_eq!(result.arrivals[0].constellation_id, ConstellationId(123));
        assert_eq!(result.arrivals[0].state, IncursionState::Established);
        assert_eq!(result.arrivals[0].staging_system_id, SolarSystemId(10_123));
        assert!(result.updates.is_empty());
        assert!(result.defeats.is_empty());
    }

    #[test]
    fn unchanged_feed_plans_nothing() {
        let stored = live(123, IncursionState::Mobilizing, true);
        let result = plan(&[feed(123, "mobilizing", true)], &[stored]);
        assert!(result.is_empty());
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn state_change_is_an_update() {
        let stored = live(123, IncursionState::Established, false);
        let id = stored.id;
        let result = plan(&[feed(123, "mobilizing", false)], &[stored]);
        assert_eq!(
            result.updates,
            vec![Update {
                incursion_id: id,
                constellation_id: ConstellationId(123),
                new_state: Some(IncursionState::Mobilizing),
                mark_boss: false,
            }]
        );
    }

    #[test]
    fn boss_only_switches_on() {
        let without = live(1, IncursionState::Established, false);
        let with = live(2, IncursionState::Established, true);
        let result = plan(
            &[feed(1, "established", true), feed(2, "established", false)],
            &[without, with],
        );
        assert_eq!(result.updates.len(), 1);
        assert_eq!(result.updates[0].constellation_id, ConstellationId(1));
        assert!(result.updates[0].mark_boss);
        assert_eq!(result.updates[0].new_state, None);
    }

    #[test]
    fn missing_location_is_a_defeat() {
        let gone = live(5, IncursionState::Withdrawing, false);
        let id = gone.id;
        let stays = live(6, IncursionState::Established, false);
        let result = plan(&[feed(6, "established", false)], &[gone, stays]);
        assert_eq!(
            result.defeats,
            vec![Defeat {
                incursion_id: id,
                constellation_id: ConstellationId(5),
            }]
        );
    }

    #[test]
    fn inactive_records_are_ignored() {
        let mut old = live(7, IncursionState::Defeated, false);
        old.active = false;
        let result = plan(&[feed(7, "established", false)], &[old]);
        assert_eq!(result.arrivals.len(), 1);
        assert!(result.defeats.is_empty());
    }

    #[test]
    fn unknown_state_is_skipped_but_not_defeated() {
        let stored = live(8, IncursionState::Established, false);
        let result = plan(&[feed(8, "contested", false)], &[stored]);
        assert!(result.defeats.is_empty());
        assert!(result.updates.is_empty());
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(
            result.skipped[0].reason,
            SkipReason::UnknownState("contested".to_owned())
        );
        assert_eq!(result.fatal_skips().count(), 1);
    }

    #[test]
    fn feed_cannot_report_defeated() {
        let result = plan(&[feed(9, "defeated", false)], &[]);
        assert!(result.arrivals.is_empty());
        assert_eq!(result.skipped.len(), 1);
    }

    #[test]
    fn duplicate_location_keeps_first_and_is_not_fatal() {
        let result = plan(
            &[feed(10, "established", false), feed(10, "mobilizing", true)],
            &[],
        );
        assert_eq!(result.arrivals.len(), 1);
        assert_eq!(result.arrivals[0].state, IncursionState::Established);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.fatal_skips().count(), 0);
    }

    #[test]
    fn out_of_order_transition_is_still_planned() {
        let stored = live(11, IncursionState::Withdrawing, false);
        let result = plan(&[feed(11, "established", false)], &[stored]);
        assert_eq!(result.updates.len(), 1);
        assert_eq!(
            result.updates[0].new_state,
            Some(IncursionState::Established)
        );
    }

    #[test]
    fn live_set_after_plan_equals_feed_keys() {
        let stored = vec![
            live(1, IncursionState::Established, false),
            live(2, IncursionState::Mobilizing, false),
            live(3, IncursionState::Withdrawing, true),
        ];
        let snapshot = vec![
            feed(2, "withdrawing", false),
            feed(3, "withdrawing", true),
            feed(4, "established", false),
        ];
        let result = plan(&snapshot, &stored);

        let defeated: BTreeSet<ConstellationId> =
            result.defeats.iter().map(|d| d.constellation_id).collect();
        let mut after: BTreeSet<ConstellationId> = stored
            .iter()
            .map(|r| r.constellation_id)
            .filter(|k| !defeated.contains(k))
            .collect();
        after.extend(result.arrivals.iter().map(|s| s.constellation_id));

        let expected: BTreeSet<ConstellationId> =
            snapshot.iter().map(|f| f.constellation_id).collect();
        assert_eq!(after, expected);
    }
}
