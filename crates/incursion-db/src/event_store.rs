//! Event ledger operations on `incursion_events`.
//!
//! The ledger is append-only. Appends happen inside the per-identity
//! transactions in [`crate::persist`] through [`append_event`]; everything
//! else here reads.
//!
//! Timestamps are stored as microseconds since the epoch and clamped at
//! append so they never go backwards for one identity. The `seq` column
//! orders events that share a timestamp.

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use sqlx::{SqliteConnection, SqlitePool};

use incursion_types::{EventKind, IncursionId, LedgerEvent};

use crate::error::DbError;
use crate::rows::{DefeatScan, EventRow, from_micros, to_micros};

const SELECT_DEFEATS: &str = r"SELECT e.incursion_id, e.recorded_at, i.constellation_id, i.tier
  FROM incursion_events e
  LEFT JOIN incursions i ON i.id = e.incursion_id
  WHERE e.state = 'defeated'
  ORDER BY e.recorded_at DESC, e.seq DESC";

/// Operations on the `incursion_events` table.
pub struct EventStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EventStore<'a> {
    /// Create a new event store bound to a connection pool.
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All events of one identity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a row does not decode.
    pub async fn timeline(&self, id: IncursionId) -> Result<Vec<LedgerEvent>, DbError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r"SELECT seq, incursion_id, state, recorded_at
              FROM incursion_events
              WHERE incursion_id = ?1
              ORDER BY recorded_at, seq",
        )
        .bind(id.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(LedgerEvent::try_from).collect()
    }

    /// Total number of events in the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn count(&self) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM incursion_events")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Defeat events joined with their incursion record, newest first.
    ///
    /// See [`defeat_scan`]; this variant reads through the pool.
    pub fn defeats_newest_first(
        &self,
    ) -> impl Stream<Item = Result<DefeatScan, DbError>> + Send + use<'a> {
        sqlx::query(SELECT_DEFEATS)
            .fetch(self.pool)
            .map(|row| row.map(|r| DefeatScan::decode(&r)).map_err(DbError::from))
    }
}

/// Defeat events joined with their incursion record, newest first, read
/// on one connection (usually inside a read transaction).
///
/// Ordered by `(recorded_at, seq)` descending. The stream is lazy: rows are
/// fetched as the caller pulls, so dropping it early stops the scan.
/// Location and tier are `None` when the record is missing. A row that does
/// not decode comes back as [`DefeatScan::Unreadable`]; only query and
/// connection failures are errors.
pub fn defeat_scan(
    conn: &mut SqliteConnection,
) -> impl Stream<Item = Result<DefeatScan, DbError>> + Send + '_ {
    sqlx::query(SELECT_DEFEATS)
        .fetch(conn)
        .map(|row| row.map(|r| DefeatScan::decode(&r)).map_err(DbError::from))
}

/// Append one event for `id` inside an open transaction.
///
/// The stored time is `max(now, latest event time for id)`, so per-identity
/// timestamps never decrease even if the clock steps back. Returns the
/// time actually recorded.
pub async fn append_event(
    conn: &mut SqliteConnection,
    id: IncursionId,
    kind: EventKind,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, DbError> {
    let (latest,): (Option<i64>,) =
        sqlx::query_as("SELECT MAX(recorded_at) FROM incursion_events WHERE incursion_id = ?1")
            .bind(id.into_inner())
            .fetch_one(&mut *conn)
            .await?;

    let now_micros = to_micros(now);
    let recorded_at = latest.map_or(now_micros, |last| last.max(now_micros));

    sqlx::query("INSERT INTO incursion_events (incursion_id, state, recorded_at) VALUES (?1, ?2, ?3)")
        .bind(id.into_inner())
        .bind(kind.as_str())
        .bind(recorded_at)
        .execute(&mut *conn)
        .await?;

    tracing::debug!(
        incursion_id = %id,
        event = kind.as_str(),
        recorded_at,
        "Appended ledger event"
    );

    from_micros(recorded_at)
}
