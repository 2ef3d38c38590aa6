//! Incursion feed access for the incursion tracker.
//!
//! The reconciler only sees the [`FeedSource`] trait. [`EsiClient`] is the
//! production implementation over the public EVE Swagger Interface.
//!
//! # Modules
//!
//! - [`source`] -- The [`FeedSource`] trait
//! - [`client`] -- [`EsiClient`] and its [`EsiConfig`]
//! - [`error`] -- [`FeedError`]

pub mod client;
pub mod error;
pub mod source;

pub use client::{EsiClient, EsiConfig};
pub use error::FeedError;
pub use source::FeedSource;
