//! Records flowing between the feed, the store and the read API.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EventKind, IncursionState, SecurityTier};
use crate::ids::{ConstellationId, IncursionId, SolarSystemId};
use crate::tiers::PerTier;

// ---------------------------------------------------------------------------
// Feed snapshot
// ---------------------------------------------------------------------------

/// One entry of the external incursion feed, as published by ESI.
///
/// `state` stays a raw string: validation happens per item during
/// reconciliation so one unknown label does not reject the whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedIncursion {
    /// Location key.
    pub constellation_id: ConstellationId,
    /// Reported state label.
    pub state: String,
    /// Whether the boss encounter is present.
    #[serde(default)]
    pub has_boss: bool,
    /// System whose security status decides the tier.
    pub staging_solar_system_id: SolarSystemId,
    /// All systems affected by the incursion.
    #[serde(default)]
    pub infested_solar_systems: Vec<SolarSystemId>,
    /// Influence level between 0 and 1.
    #[serde(default)]
    pub influence: f64,
    /// Owning faction.
    #[serde(default)]
    pub faction_id: Option<i64>,
    /// Incursion type, e.g. `"Incursion"`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

/// One row of the snapshot projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncursionRecord {
    /// Identity.
    pub id: IncursionId,
    /// Location key.
    pub constellation_id: ConstellationId,
    /// Current state.
    pub state: IncursionState,
    /// Whether the boss modifier has been seen.
    pub has_boss: bool,
    /// Tier assigned at establishment. `None` only for malformed rows.
    pub tier: Option<SecurityTier>,
    /// Whether the incursion is still live.
    pub active: bool,
    /// When the incursion was first observed.
    pub established_at: DateTime<Utc>,
}

/// One immutable ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Store-assigned append order.
    pub sequence: i64,
    /// Identity the event belongs to.
    pub incursion_id: IncursionId,
    /// What happened.
    pub kind: EventKind,
    /// When it was recorded.
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Read views
// ---------------------------------------------------------------------------

/// Timestamp of the latest event for each label.
pub type StateHistory = BTreeMap<EventKind, DateTime<Utc>>;

/// A live incursion as served by the read API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LiveIncursion {
    /// Identity.
    #[serde(rename = "uuid")]
    pub incursion_id: IncursionId,
    /// Location key.
    pub constellation_id: ConstellationId,
    /// Tier assigned at establishment.
    pub tier: Option<SecurityTier>,
    /// Current state.
    pub state: IncursionState,
    /// Whether the boss modifier has been seen.
    pub has_boss: bool,
    /// When each state (and the boss) was recorded.
    pub history: StateHistory,
}

/// Live incursions keyed by location.
pub type LiveBoard = BTreeMap<ConstellationId, LiveIncursion>;

/// A recently defeated incursion in the timer view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimerEntry {
    /// Location key.
    pub constellation_id: ConstellationId,
    /// Identity.
    #[serde(rename = "uuid")]
    pub incursion_id: IncursionId,
    /// Tier the incursion was classified into.
    pub tier: SecurityTier,
    /// When the defeat was recorded.
    pub time: DateTime<Utc>,
    /// Minimal history holding just the defeat event.
    pub history: StateHistory,
}

impl TimerEntry {
    /// Build an entry whose history is the single defeat event.
    pub fn defeated(
        incursion_id: IncursionId,
        constellation_id: ConstellationId,
        tier: SecurityTier,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            constellation_id,
            incursion_id,
            tier,
            time,
            history: BTreeMap::from([(EventKind::Defeated, time)]),
        }
    }
}

/// Recently defeated incursions, most recent first, per tier.
pub type TimerBoard = PerTier<Vec<TimerEntry>>;
