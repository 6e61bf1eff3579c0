//! Type-safe identifier wrappers.
//!
//! Agents live in a contiguous arena; an identifier is the arena slot index
//! wrapped in a newtype so it cannot be mixed up with cell indices or counts
//! at compile time. Identifiers are handed out monotonically and never reused
//! within a run, so retiring one agent never invalidates another's id.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a `u32` arena index with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Create an identifier from a raw arena index.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Return the inner index value.
            pub const fn into_inner(self) -> u32 {
                self.0
            }

            /// Return the arena slot this identifier addresses.
            pub fn slot(self) -> usize {
                usize::try_from(self.0).unwrap_or(usize::MAX)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Stable identifier for a population agent (susceptible, incubating,
    /// or infected) in the grid variant's agent arena.
    AgentId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrip_serde() {
        let original = AgentId::new(17);
        let json = serde_json::to_string(&original).ok();
        assert_eq!(json.as_deref(), Some("17"));
        let restored: Result<AgentId, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn id_display_is_prefixed() {
        assert_eq!(AgentId::new(3).to_string(), "#3");
    }

    #[test]
    fn slot_matches_raw_index() {
        assert_eq!(AgentId::from(42).slot(), 42);
        assert_eq!(u32::from(AgentId::new(9)), 9);
    }
}
