//! Data layer for the incursion tracker (`SQLite`).
//!
//! Two tables hold all state. `incursion_events` is the append-only ledger
//! and the single source of truth; `incursions` is the snapshot projection
//! derived from it, written only in the same transaction as a ledger append.
//!
//! # Architecture
//!
//! ```text
//! Reconciliation cycle (single writer)
//!     |
//!     +-- persist::*  one transaction per identity
//!         |-- incursion_events  (append)
//!         +-- incursions        (insert / update)
//!
//! Read API (concurrent, WAL)
//!     |-- IncursionStore   live records, tier counts, live join
//!     +-- EventStore       per-identity timeline, defeat stream
//! ```
//!
//! # Modules
//!
//! - [`sqlite`] -- Connection pool, configuration and migrations
//! - [`incursion_store`] -- Projection reads
//! - [`event_store`] -- Ledger reads and the append primitive
//! - [`persist`] -- Per-identity transactional writes
//! - [`rows`] -- Raw rows and decoding into domain types
//! - [`error`] -- Shared error types

pub mod error;
pub mod event_store;
pub mod incursion_store;
pub mod persist;
pub mod rows;
pub mod sqlite;

// Re-export primary types for convenience.
pub use error::DbError;
pub use event_store::{EventStore, defeat_scan};
pub use incursion_store::{IncursionStore, active_tier_counts};
pub use rows::DefeatScan;
pub use persist::{PersistError, persist_defeat, persist_establishment, persist_update};
pub use sqlite::{SqliteConfig, SqliteStore};
