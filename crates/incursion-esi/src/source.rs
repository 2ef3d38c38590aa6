//! The seam between the reconciler and whatever produces feed snapshots.

use std::future::Future;

use incursion_types::{FeedIncursion, SolarSystemId};

use crate::error::FeedError;

/// A read-only source of incursion snapshots and system security.
///
/// The reconciler is generic over this trait, so tests can drive a cycle
/// from an in-memory snapshot without any HTTP.
pub trait FeedSource: Send + Sync {
    /// Every incursion the feed currently reports, in feed order.
    fn fetch_incursions(
        &self,
    ) -> impl Future<Output = Result<Vec<FeedIncursion>, FeedError>> + Send;

    /// Raw security status of a solar system.
    fn system_security(
        &self,
        system: SolarSystemId,
    ) -> impl Future<Output = Result<f64, FeedError>> + Send;
}
