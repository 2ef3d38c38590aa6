//! Configuration, reconciliation and history reconstruction for the
//! incursion tracker.
//!
//! This crate wires the pure decision logic in `incursion-ledger` to the
//! store in `incursion-db` and the feed in `incursion-esi`.
//!
//! # Modules
//!
//! - [`clock`] -- [`Clock`] trait for ledger timestamps, with system and
//!   manual implementations.
//! - [`config`] -- Configuration loading from `incursion-config.yaml` into
//!   strongly-typed structs.
//! - [`context`] -- [`TrackerContext`], the shared store, clock and config.
//! - [`reconciler`] -- One reconciliation cycle against a [`FeedSource`].
//! - [`scheduler`] -- Periodic cycles until shutdown.
//! - [`history`] -- Live and recent-history views.
//! - [`logging`] -- Subscriber setup for the binaries.
//!
//! [`Clock`]: clock::Clock
//! [`FeedSource`]: incursion_esi::FeedSource

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod logging;
pub mod reconciler;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, TrackerConfig};
pub use context::TrackerContext;
pub use error::{CoreError, HistoryError, ReconcileError};
pub use history::HistoryReconstructor;
pub use logging::init_tracing;
pub use reconciler::{CycleReport, Reconciler};
pub use scheduler::{SchedulerSummary, run_scheduler};
