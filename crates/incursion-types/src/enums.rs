//! Enumeration types for incursion lifecycle and classification.
//!
//! Every enum here has a stable lowercase label that is used both on the
//! wire (JSON) and in the store. [`core::str::FromStr`] is the only way back
//! from a label, so an unrecognised string surfaces as a
//! [`UnknownLabel`] error instead of a silently defaulted variant.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A label that does not name any variant of the target enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} label: {label:?}")]
pub struct UnknownLabel {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The offending label.
    pub label: String,
}

/// Implements `as_str`, `Display` and `FromStr` from one label table.
macro_rules! labelled {
    ($name:ident, $kind:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stable lowercase label for this variant.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl core::str::FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    other => Err(UnknownLabel {
                        kind: $kind,
                        label: other.to_owned(),
                    }),
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Incursion state
// ---------------------------------------------------------------------------

/// Primary lifecycle state of an incursion.
///
/// The expected progression is
/// `Established -> Mobilizing -> Withdrawing -> Defeated`. The feed only ever
/// reports the first three; `Defeated` is assigned locally when the feed stops
/// reporting the location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum IncursionState {
    /// The incursion has just spawned.
    Established,
    /// The incursion is gathering strength.
    Mobilizing,
    /// The incursion is about to despawn on its own.
    Withdrawing,
    /// The incursion is over.
    Defeated,
}

labelled!(IncursionState, "incursion state", {
    Established => "established",
    Mobilizing => "mobilizing",
    Withdrawing => "withdrawing",
    Defeated => "defeated",
});

impl IncursionState {
    /// Position in the expected lifecycle (0 = established).
    pub const fn rank(self) -> u8 {
        match self {
            Self::Established => 0,
            Self::Mobilizing => 1,
            Self::Withdrawing => 2,
            Self::Defeated => 3,
        }
    }

    /// Whether moving from `self` to `next` follows the expected order.
    pub const fn precedes(self, next: Self) -> bool {
        self.rank() < next.rank()
    }
}

// ---------------------------------------------------------------------------
// Ledger event kind
// ---------------------------------------------------------------------------

/// The label recorded on a ledger event.
///
/// Four kinds mirror [`IncursionState`]; [`EventKind::Boss`] is the
/// pseudo-state marking the boss modifier switching on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// State changed to established.
    Established,
    /// State changed to mobilizing.
    Mobilizing,
    /// State changed to withdrawing.
    Withdrawing,
    /// The incursion concluded.
    Defeated,
    /// The boss modifier appeared.
    Boss,
}

labelled!(EventKind, "event kind", {
    Established => "established",
    Mobilizing => "mobilizing",
    Withdrawing => "withdrawing",
    Defeated => "defeated",
    Boss => "boss",
});

impl From<IncursionState> for EventKind {
    fn from(state: IncursionState) -> Self {
        match state {
            IncursionState::Established => Self::Established,
            IncursionState::Mobilizing => Self::Mobilizing,
            IncursionState::Withdrawing => Self::Withdrawing,
            IncursionState::Defeated => Self::Defeated,
        }
    }
}

// ---------------------------------------------------------------------------
// Security tier
// ---------------------------------------------------------------------------

/// Severity tier of an incursion, fixed at establishment from the staging
/// system's security status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SecurityTier {
    /// High-security space.
    High,
    /// Low-security space.
    Low,
    /// Null-security space.
    Null,
}

labelled!(SecurityTier, "security tier", {
    High => "high",
    Low => "low",
    Null => "null",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_back() {
        for state in IncursionState::ALL {
            assert_eq!(state.as_str().parse::<IncursionState>().ok(), Some(*state));
        }
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().ok(), Some(*kind));
        }
        for tier in SecurityTier::ALL {
            assert_eq!(tier.as_str().parse::<SecurityTier>().ok(), Some(*tier));
        }
    }

    #[test]
    fn unknown_label_is_an_error() {
        let err = "contested".parse::<IncursionState>().err();
        assert_eq!(
            err,
            Some(UnknownLabel {
                kind: "incursion state",
                label: "contested".to_owned(),
            })
        );
        assert!("nullsec".parse::<SecurityTier>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_labels() {
        let json = serde_json::to_string(&SecurityTier::Null).ok();
        assert_eq!(json.as_deref(), Some("\"null\""));
        let kind: Result<EventKind, _> = serde_json::from_str("\"boss\"");
        assert_eq!(kind.ok(), Some(EventKind::Boss));
    }

    #[test]
    fn lifecycle_order() {
        assert!(IncursionState::Established.precedes(IncursionState::Mobilizing));
        assert!(IncursionState::Mobilizing.precedes(IncursionState::Withdrawing));
        assert!(!IncursionState::Withdrawing.precedes(IncursionState::Established));
        assert!(!IncursionState::Mobilizing.precedes(IncursionState::Mobilizing));
    }

    #[test]
    fn state_maps_to_event_kind() {
        assert_eq!(EventKind::from(IncursionState::Withdrawing), EventKind::Withdrawing);
        assert_eq!(EventKind::from(IncursionState::Defeated), EventKind::Defeated);
    }
}
