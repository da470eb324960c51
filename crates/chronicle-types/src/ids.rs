//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the event model has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. All IDs use UUID v7
//! (time-ordered): the leading bits encode the creation timestamp and the
//! trailing bits are random, so sorting by ID approximates creation order
//! across processes without any coordination. This is what lets the
//! aggregation layer use the ID as a deterministic tie-breaker when two
//! events carry the same timestamp.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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

        impl core::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id! {
    /// Unique identifier for a single event within a run.
    EventId
}

define_id! {
    /// Unique identifier for one execution of the host simulation.
    ///
    /// The run ID doubles as the name of the run's event directory on disk,
    /// so it is the unit of storage isolation.
    RunId
}

define_id! {
    /// Unique identifier for an agent acting inside the simulation.
    ActorId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let event = EventId::new();
        let run = RunId::new();
        // These are different types -- the compiler enforces no mixing.
        assert_ne!(event.into_inner(), Uuid::nil());
        assert_ne!(run.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = EventId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<EventId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert!(restored.is_ok());
    }

    #[test]
    fn v7_ids_sort_by_creation_order() {
        // UUID v7 is time-prefixed: later IDs never sort before earlier
        // ones as long as the wall clock does not step backwards.
        let first = EventId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = EventId::new();
        assert!(first < second);
    }

    #[test]
    fn id_display_parses_back() {
        let id = ActorId::new();
        let parsed: Result<ActorId, _> = id.to_string().parse();
        assert_eq!(parsed.ok(), Some(id));
    }
}
