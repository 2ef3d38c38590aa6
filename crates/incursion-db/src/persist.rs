//! Per-identity persistence of a reconciliation plan.
//!
//! Each function applies one plan item in its own transaction: the ledger
//! append(s) and the projection write commit together or not at all. A
//! failure rolls back that identity only; the caller moves on to the next.
//!
//! ```text
//! persist_establishment  INSERT incursions + <state> event (+ boss event)
//! persist_update         <state> event and/or boss event + UPDATE incursions
//! persist_defeat         defeated event + UPDATE incursions (inactive)
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use incursion_ledger::{Defeat, Establishment, Update};
use incursion_types::{EventKind, IncursionId, IncursionRecord, IncursionState};

use crate::error::DbError;
use crate::event_store::append_event;
use crate::rows::to_micros;

/// Errors that can occur while applying one plan item.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The store rejected a statement; the transaction was rolled back.
    #[error("store error: {0}")]
    Store(#[from] DbError),

    /// The targeted incursion is no longer live.
    #[error("incursion {0} is not active")]
    NotActive(IncursionId),
}

impl From<sqlx::Error> for PersistError {
    fn from(e: sqlx::Error) -> Self {
        Self::Store(DbError::Sqlite(e))
    }
}

/// Establish a new incursion.
///
/// Inserts the live record and appends an event labelled with the reported
/// state. A boss already present on first sighting appends a boss event in
/// the same transaction.
///
/// # Errors
///
/// Returns [`PersistError::Store`] if any statement fails, including the
/// unique-location constraint when the location is already live.
pub async fn persist_establishment(
    pool: &SqlitePool,
    establishment: &Establishment,
    now: DateTime<Utc>,
) -> Result<IncursionRecord, PersistError> {
    let sighting = &establishment.sighting;
    let id = establishment.incursion_id;
    let mut tx = pool.begin().await?;

    sqlx::query(
        r"INSERT INTO incursions (id, constellation_id, state, has_boss, tier, active, established_at)
          VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
    )
    .bind(id.into_inner())
    .bind(sighting.constellation_id.into_inner())
    .bind(sighting.state.as_str())
    .bind(sighting.has_boss)
    .bind(establishment.tier.as_str())
    .bind(to_micros(now))
    .execute(&mut *tx)
    .await?;

    let established_at = append_event(&mut *tx, id, EventKind::from(sighting.state), now).await?;
    if sighting.has_boss {
        append_event(&mut *tx, id, EventKind::Boss, now).await?;
    }

    tx.commit().await?;

    tracing::debug!(
        incursion_id = %id,
        constellation_id = %sighting.constellation_id,
        state = %sighting.state,
        tier = %establishment.tier,
        has_boss = sighting.has_boss,
        "Persisted establishment"
    );

    Ok(IncursionRecord {
        id,
        constellation_id: sighting.constellation_id,
        state: sighting.state,
        has_boss: sighting.has_boss,
        tier: Some(establishment.tier),
        active: true,
        established_at,
    })
}

/// Apply a state change and/or boss mark to a live incursion.
///
/// The boss flag is only ever switched on.
///
/// # Errors
///
/// Returns [`PersistError::NotActive`] if the incursion is not live, or
/// [`PersistError::Store`] if any statement fails.
pub async fn persist_update(
    pool: &SqlitePool,
    update: &Update,
    now: DateTime<Utc>,
) -> Result<(), PersistError> {
    let id = update.incursion_id;
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r"UPDATE incursions
          SET state = COALESCE(?2, state),
              has_boss = has_boss OR ?3
          WHERE id = ?1 AND active = 1",
    )
    .bind(id.into_inner())
    .bind(update.new_state.map(IncursionState::as_str))
    .bind(update.mark_boss)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(PersistError::NotActive(id));
    }

    if let Some(state) = update.new_state {
        append_event(&mut *tx, id, EventKind::from(state), now).await?;
    }
    if update.mark_boss {
        append_event(&mut *tx, id, EventKind::Boss, now).await?;
    }

    tx.commit().await?;

    tracing::debug!(
        incursion_id = %id,
        constellation_id = %update.constellation_id,
        new_state = ?update.new_state,
        mark_boss = update.mark_boss,
        "Persisted update"
    );
    Ok(())
}

/// Conclude a live incursion.
///
/// Sets the state to defeated and clears the active flag. Tier and history
/// are retained.
///
/// # Errors
///
/// Returns [`PersistError::NotActive`] if the incursion is not live, or
/// [`PersistError::Store`] if any statement fails.
pub async fn persist_defeat(
    pool: &SqlitePool,
    defeat: &Defeat,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, PersistError> {
    let id = defeat.incursion_id;
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r"UPDATE incursions
          SET state = ?2, active = 0
          WHERE id = ?1 AND active = 1",
    )
    .bind(id.into_inner())
    .bind(IncursionState::Defeated.as_str())
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(PersistError::NotActive(id));
    }

    let defeated_at = append_event(&mut *tx, id, EventKind::Defeated, now).await?;
    tx.commit().await?;

    tracing::debug!(
        incursion_id = %id,
        constellation_id = %defeat.constellation_id,
        %defeated_at,
        "Persisted defeat"
    );
    Ok(defeated_at)
}
