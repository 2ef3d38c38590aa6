//! Process-wide tracker context.
//!
//! [`TrackerContext`] is created once at startup and handed (behind an
//! [`Arc`]) to the reconciler, the history views and the API. It owns the
//! store handle, the clock and the configuration; nothing else is global.

use std::sync::Arc;

use incursion_db::SqliteStore;

use crate::clock::{Clock, SystemClock};
use crate::config::TrackerConfig;
use crate::error::CoreError;

/// Store, clock and configuration shared by every component.
#[derive(Clone)]
pub struct TrackerContext {
    store: SqliteStore,
    clock: Arc<dyn Clock>,
    config: TrackerConfig,
}

impl TrackerContext {
    /// Open the configured store, run migrations and use the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if the store cannot be opened or
    /// migrated.
    pub async fn open(config: TrackerConfig) -> Result<Self, CoreError> {
        let store = SqliteStore::connect(&config.database.sqlite()).await?;
        store.run_migrations().await?;
        Ok(Self::from_parts(store, Arc::new(SystemClock), config))
    }

    /// Assemble a context from already-open parts.
    pub const fn from_parts(store: SqliteStore, clock: Arc<dyn Clock>, config: TrackerConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// The store handle.
    pub const fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// The clock used for ledger timestamps.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// The loaded configuration.
    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Close the store. Call once at shutdown.
    pub async fn close(&self) {
        self.store.close().await;
    }
}

impl core::fmt::Debug for TrackerContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TrackerContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
