//! Pure decision logic for the incursion tracker.
//!
//! Nothing here touches the network or the database. The store and the
//! feed client feed rows and snapshots in; this crate decides what they
//! mean.
//!
//! # Modules
//!
//! - [`security`] -- Security status to [`SecurityTier`](incursion_types::SecurityTier)
//!   classification on rounded decimals.
//! - [`reconcile`] -- Diff of a feed snapshot against the live set.
//! - [`history`] -- Live-view assembly from joined rows.
//! - [`timers`] -- Bounded per-tier fold over defeat events.
//!
//! # Cycle shape
//!
//! ```text
//! feed snapshot + live records
//!        |
//!   reconcile::plan  --> arrivals / updates / defeats / skipped
//!        |
//!   security::classify (arrivals only)
//!        |
//!   store applies each item in its own transaction
//! ```
//!
//! # Usage
//!
//! ```
//! use incursion_ledger::timers::{fold_timers, DEFAULT_CAPACITY};
//! use incursion_types::PerTier;
//!
//! // Every tier already full of live incursions: nothing is read.
//! let board = fold_timers(&DEFAULT_CAPACITY, &PerTier::new(1, 1, 3), Vec::new());
//! assert!(board.high.is_empty() && board.null.is_empty());
//! ```

pub mod history;
pub mod reconcile;
pub mod security;
pub mod timers;

pub use history::{LiveRow, assemble_live};
pub use reconcile::{
    Defeat, Establishment, ReconcilePlan, Sighting, Skip, SkipReason, Update, plan, validate,
};
pub use security::SecurityPolicy;
pub use timers::{DEFAULT_CAPACITY, DefeatRecord, TimerFold, fold_timers};

/// Errors raised by the decision logic.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// The security status cannot be represented as a decimal (NaN or
    /// infinite).
    #[error("security status {0} is not a finite number")]
    NonFiniteSecurity(f64),

    /// The classification thresholds are inconsistent.
    #[error("invalid security policy: {0}")]
    InvalidPolicy(String),
}
