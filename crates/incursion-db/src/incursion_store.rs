//! Read operations on the `incursions` snapshot projection.
//!
//! The projection is only written by [`crate::persist`] alongside ledger
//! appends; this store never mutates it.

use sqlx::{SqliteConnection, SqlitePool};

use incursion_ledger::LiveRow;
use incursion_types::{ConstellationId, IncursionId, IncursionRecord, PerTier, SecurityTier};

use crate::error::DbError;
use crate::rows::{IncursionRow, LiveJoinRow};

const SELECT_INCURSION: &str = r"SELECT id, constellation_id, state, has_boss, tier, active, established_at
  FROM incursions";

/// Operations on the `incursions` table.
pub struct IncursionStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> IncursionStore<'a> {
    /// Create a new incursion store bound to a connection pool.
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All active incursions, ordered by location key.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails or [`DbError::Corrupt`]
    /// if a row does not decode.
    pub async fn live(&self) -> Result<Vec<IncursionRecord>, DbError> {
        let rows = sqlx::query_as::<_, IncursionRow>(&format!(
            "{SELECT_INCURSION} WHERE active = 1 ORDER BY constellation_id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(IncursionRecord::try_from).collect()
    }

    /// Look up one incursion by identity, live or not.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or the row does not decode.
    pub async fn get(&self, id: IncursionId) -> Result<Option<IncursionRecord>, DbError> {
        let row = sqlx::query_as::<_, IncursionRow>(&format!("{SELECT_INCURSION} WHERE id = ?1"))
            .bind(id.into_inner())
            .fetch_optional(self.pool)
            .await?;

        row.map(IncursionRecord::try_from).transpose()
    }

    /// The active incursion at a location, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or the row does not decode.
    pub async fn active_at(
        &self,
        constellation_id: ConstellationId,
    ) -> Result<Option<IncursionRecord>, DbError> {
        let row = sqlx::query_as::<_, IncursionRow>(&format!(
            "{SELECT_INCURSION} WHERE constellation_id = ?1 AND active = 1"
        ))
        .bind(constellation_id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(IncursionRecord::try_from).transpose()
    }

    /// Number of active incursions per tier. See [`active_tier_counts`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn active_tier_counts(&self) -> Result<PerTier<usize>, DbError> {
        let mut conn = self.pool.acquire().await?;
        active_tier_counts(&mut conn).await
    }

    /// Every active incursion joined with each of its ledger events.
    ///
    /// Incursions without events yield one row with no event.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a row does not decode.
    pub async fn live_rows(&self) -> Result<Vec<LiveRow>, DbError> {
        let rows = sqlx::query_as::<_, LiveJoinRow>(
            r"SELECT i.id, i.constellation_id, i.state, i.has_boss, i.tier,
                     e.state AS event_state, e.recorded_at
              FROM incursions i
              LEFT JOIN incursion_events e ON e.incursion_id = i.id
              WHERE i.active = 1
              ORDER BY i.constellation_id, e.recorded_at, e.seq",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(LiveRow::try_from).collect()
    }
}

/// Number of active incursions per tier, read on one connection.
///
/// Active rows without a recognised tier count toward no tier.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn active_tier_counts(conn: &mut SqliteConnection) -> Result<PerTier<usize>, DbError> {
    let rows: Vec<(Option<String>, i64)> = sqlx::query_as(
        r"SELECT tier, COUNT(*) FROM incursions
          WHERE active = 1
          GROUP BY tier",
    )
    .fetch_all(conn)
    .await?;

    let mut counts = PerTier::<usize>::default();
    for (label, count) in rows {
        let Some(tier) = label.as_deref().and_then(|l| l.parse::<SecurityTier>().ok()) else {
            tracing::warn!(
                tier = label.as_deref().unwrap_or("<none>"),
                count,
                "Active incursions with unresolved tier"
            );
            continue;
        };
        *counts.get_mut(tier) = usize::try_from(count)
            .map_err(|e| DbError::Corrupt(format!("tier count {count}: {e}")))?;
    }
    Ok(counts)
}
