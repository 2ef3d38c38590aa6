//! Error types for tracker orchestration.

use incursion_db::DbError;
use incursion_ledger::Skip;
use incursion_esi::FeedError;

use crate::config::ConfigError;

/// Errors raised while opening or closing a [`TrackerContext`](crate::TrackerContext).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The store could not be opened or migrated.
    #[error("store error: {0}")]
    Store(#[from] DbError),

    /// The feed client could not be built.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Errors that abort a whole reconciliation cycle.
///
/// Per-identity write failures do not abort a cycle; they are counted in
/// the [`CycleReport`](crate::CycleReport) instead.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The feed snapshot could not be fetched or decoded.
    #[error("feed unavailable: {0}")]
    Feed(#[from] FeedError),

    /// The live set could not be read.
    #[error("store error: {0}")]
    Store(#[from] DbError),

    /// Strict mode refused to apply a plan with unusable feed entries.
    #[error("{} unusable feed entries, first: {}", .0.len(), first_skip(.0))]
    FatalSkips(Vec<Skip>),
}

fn first_skip(skips: &[Skip]) -> String {
    skips
        .first()
        .map_or_else(|| "none".to_owned(), ToString::to_string)
}

/// Errors raised by the read-side views.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The store could not be read.
    #[error("store error: {0}")]
    Store(#[from] DbError),
}
