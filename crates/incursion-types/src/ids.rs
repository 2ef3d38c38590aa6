//! Type-safe identifier wrappers.
//!
//! Incursion identities are internally generated UUIDs (v7, time-ordered so
//! the ledger's identity index stays append-friendly). Location keys are the
//! feed's own integer identifiers and get their own newtypes so a
//! constellation can never be passed where a solar system is expected.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Generates a transparent newtype around an external integer key.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(#[ts(type = "number")] pub i64);

        impl $name {
            /// Return the raw feed identifier.
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

define_id! {
    /// Identity of one incursion, assigned once at establishment and never
    /// reused.
    IncursionId
}

define_key! {
    /// The feed's constellation identifier: the location key of an incursion.
    ConstellationId
}

define_key! {
    /// The feed's solar system identifier, used to look up security status.
    SolarSystemId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incursion_ids_are_unique() {
        let a = IncursionId::new();
        let b = IncursionId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn incursion_id_display_matches_uuid() {
        let id = IncursionId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }

    #[test]
    fn location_keys_serialize_as_bare_integers() {
        let json = serde_json::to_string(&ConstellationId(20_000_123)).ok();
        assert_eq!(json.as_deref(), Some("20000123"));

        let parsed: Result<SolarSystemId, _> = serde_json::from_str("30000142");
        assert_eq!(parsed.ok(), Some(SolarSystemId(30_000_142)));
    }
}
