//! A value for each [`SecurityTier`].
//!
//! [`PerTier`] replaces string-keyed maps: every tier always has a slot, so
//! indexing by tier is total and cannot miss.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::SecurityTier;

/// One `T` per security tier.
///
/// Serializes as a JSON object keyed by the tier labels
/// (`{"high": .., "low": .., "null": ..}`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PerTier<T> {
    /// Value for [`SecurityTier::High`].
    pub high: T,
    /// Value for [`SecurityTier::Low`].
    pub low: T,
    /// Value for [`SecurityTier::Null`].
    pub null: T,
}

impl<T> PerTier<T> {
    /// Build from explicit per-tier values.
    pub const fn new(high: T, low: T, null: T) -> Self {
        Self { high, low, null }
    }

    /// Shared access to one tier's slot.
    pub const fn get(&self, tier: SecurityTier) -> &T {
        match tier {
            SecurityTier::High => &self.high,
            SecurityTier::Low => &self.low,
            SecurityTier::Null => &self.null,
        }
    }

    /// Mutable access to one tier's slot.
    pub const fn get_mut(&mut self, tier: SecurityTier) -> &mut T {
        match tier {
            SecurityTier::High => &mut self.high,
            SecurityTier::Low => &mut self.low,
            SecurityTier::Null => &mut self.null,
        }
    }

    /// Iterate `(tier, value)` pairs in tier order.
    pub fn iter(&self) -> impl Iterator<Item = (SecurityTier, &T)> {
        [
            (SecurityTier::High, &self.high),
            (SecurityTier::Low, &self.low),
            (SecurityTier::Null, &self.null),
        ]
        .into_iter()
    }
}

impl PerTier<usize> {
    /// `self - other` per tier, floored at zero.
    #[must_use]
    pub const fn saturating_sub(&self, other: &Self) -> Self {
        Self {
            high: self.high.saturating_sub(other.high),
            low: self.low.saturating_sub(other.low),
            null: self.null.saturating_sub(other.null),
        }
    }

    /// Whether every slot is zero.
    pub const fn all_zero(&self) -> bool {
        self.high == 0 && self.low == 0 && self.null == 0
    }
}
