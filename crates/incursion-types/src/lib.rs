//! Shared type definitions for the incursion tracker.
//!
//! This crate is the single source of truth for the types used across the
//! workspace. Read-view types flow downstream to `TypeScript` via `ts-rs`
//! for the browser client.
//!
//! # Modules
//!
//! - [`ids`] -- Incursion identity and feed location keys
//! - [`enums`] -- Lifecycle states, ledger event kinds, security tiers
//! - [`tiers`] -- [`PerTier`], a total per-tier record
//! - [`structs`] -- Feed entries, stored records and read views

pub mod enums;
pub mod ids;
pub mod structs;
pub mod tiers;

// Re-export all public types at crate root for convenience.
pub use enums::{EventKind, IncursionState, SecurityTier, UnknownLabel};
pub use ids::{ConstellationId, IncursionId, SolarSystemId};
pub use structs::{
    FeedIncursion, IncursionRecord, LedgerEvent, LiveBoard, LiveIncursion, StateHistory,
    TimerBoard, TimerEntry,
};
pub use tiers::PerTier;
