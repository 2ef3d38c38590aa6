//! Raw table rows and their conversion into domain types.
//!
//! Rows are decoded with runtime types (`TEXT` labels, integer micros) and
//! converted afterwards, so a bad label surfaces as [`DbError::Corrupt`]
//! instead of a decode panic.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use incursion_ledger::{DefeatRecord, LiveRow};
use incursion_types::{
    ConstellationId, EventKind, IncursionId, IncursionRecord, IncursionState, LedgerEvent,
    SecurityTier,
};

use crate::error::DbError;

/// Microseconds since the Unix epoch, the ledger's time unit.
pub fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

/// Inverse of [`to_micros`].
pub fn from_micros(micros: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| DbError::Corrupt(format!("timestamp {micros} out of range")))
}

fn parse_state(label: &str) -> Result<IncursionState, DbError> {
    label
        .parse()
        .map_err(|e| DbError::Corrupt(format!("incursion state: {e}")))
}

fn parse_kind(label: &str) -> Result<EventKind, DbError> {
    label
        .parse()
        .map_err(|e| DbError::Corrupt(format!("event label: {e}")))
}

/// Tiers are read leniently: an unknown label reads as unresolved.
fn parse_tier(id: Uuid, label: Option<&str>) -> Option<SecurityTier> {
    let label = label?;
    match label.parse() {
        Ok(tier) => Some(tier),
        Err(e) => {
            tracing::warn!(incursion_id = %id, error = %e, "Unrecognised tier label");
            None
        }
    }
}

/// A row from the `incursions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IncursionRow {
    /// Identity.
    pub id: Uuid,
    /// Feed location key.
    pub constellation_id: i64,
    /// State label.
    pub state: String,
    /// Boss flag.
    pub has_boss: bool,
    /// Tier label, if any.
    pub tier: Option<String>,
    /// Live flag.
    pub active: bool,
    /// Establishment time in micros.
    pub established_at: i64,
}

impl TryFrom<IncursionRow> for IncursionRecord {
    type Error = DbError;

    fn try_from(row: IncursionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: IncursionId(row.id),
            constellation_id: ConstellationId(row.constellation_id),
            state: parse_state(&row.state)?,
            has_boss: row.has_boss,
            tier: parse_tier(row.id, row.tier.as_deref()),
            active: row.active,
            established_at: from_micros(row.established_at)?,
        })
    }
}

/// A row from the `incursion_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Store-assigned sequence number.
    pub seq: i64,
    /// Identity the event belongs to.
    pub incursion_id: Uuid,
    /// Event label.
    pub state: String,
    /// Append time in micros.
    pub recorded_at: i64,
}

impl TryFrom<EventRow> for LedgerEvent {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            sequence: row.seq,
            incursion_id: IncursionId(row.incursion_id),
            kind: parse_kind(&row.state)?,
            recorded_at: from_micros(row.recorded_at)?,
        })
    }
}

/// An active incursion left-joined with one of its events.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LiveJoinRow {
    /// Identity.
    pub id: Uuid,
    /// Feed location key.
    pub constellation_id: i64,
    /// State label.
    pub state: String,
    /// Boss flag.
    pub has_boss: bool,
    /// Tier label, if any.
    pub tier: Option<String>,
    /// Event label, absent when the incursion has no events.
    pub event_state: Option<String>,
    /// Event time in micros.
    pub recorded_at: Option<i64>,
}

impl TryFrom<LiveJoinRow> for LiveRow {
    type Error = DbError;

    fn try_from(row: LiveJoinRow) -> Result<Self, Self::Error> {
        let event = match (row.event_state.as_deref(), row.recorded_at) {
            (Some(label), Some(micros)) => Some((parse_kind(label)?, from_micros(micros)?)),
            _ => None,
        };
        Ok(Self {
            incursion_id: IncursionId(row.id),
            constellation_id: ConstellationId(row.constellation_id),
            state: parse_state(&row.state)?,
            has_boss: row.has_boss,
            tier: parse_tier(row.id, row.tier.as_deref()),
            event,
        })
    }
}

/// A defeat event left-joined with its incursion record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DefeatRow {
    /// Identity of the defeated incursion.
    pub incursion_id: Uuid,
    /// Defeat time in micros.
    pub recorded_at: i64,
    /// Location key, absent without a record.
    pub constellation_id: Option<i64>,
    /// Tier label, absent without a record or tier.
    pub tier: Option<String>,
}

impl TryFrom<DefeatRow> for DefeatRecord {
    type Error = DbError;

    fn try_from(row: DefeatRow) -> Result<Self, Self::Error> {
        Ok(Self {
            incursion_id: IncursionId(row.incursion_id),
            constellation_id: row.constellation_id.map(ConstellationId),
            tier: parse_tier(row.incursion_id, row.tier.as_deref()),
            defeated_at: from_micros(row.recorded_at)?,
        })
    }
}

/// One row of the defeat scan.
///
/// A row that fails to decode does not end the scan. It is reported as
/// [`DefeatScan::Unreadable`] with whatever identity could still be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefeatScan {
    /// A fully decoded defeat.
    Decoded(DefeatRecord),
    /// A defeat row with a bad column or an out-of-range time.
    Unreadable {
        /// Identity of the row, if that column still decodes.
        incursion_id: Option<IncursionId>,
        /// Why the row was rejected.
        reason: String,
    },
}

impl DefeatScan {
    /// Decode one raw row of the defeat query.
    pub fn decode(row: &SqliteRow) -> Self {
        match DefeatRow::from_row(row)
            .map_err(DbError::from)
            .and_then(DefeatRecord::try_from)
        {
            Ok(record) => Self::Decoded(record),
            Err(e) => Self::Unreadable {
                incursion_id: row.try_get::<Uuid, _>("incursion_id").ok().map(IncursionId),
                reason: e.to_string(),
            },
        }
    }
}
