//! Enumeration types for the Chronicle event model.
//!
//! The event kind taxonomy, the per-kind discriminator enums used inside
//! payloads, and the verbosity policy that decides which kinds a writer
//! persists.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event kinds
// ---------------------------------------------------------------------------

/// The category of an event.
///
/// Mirrors the payload variants of [`EventPayload`](crate::event::EventPayload)
/// without carrying the payload data, so filtering and verbosity checks can
/// work on a cheap `Copy` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Run- or turn-level boundary markers (turn start/end, phase changes).
    Milestone,
    /// A choice an agent made, with the before/after values where relevant.
    Decision,
    /// A concrete action an agent performed.
    Action,
    /// A state variable transition, global or actor-scoped.
    State,
    /// Fine-grained intermediate calculation values.
    Detail,
    /// Subsystem status reports (errors, retries, warnings).
    System,
}

impl EventKind {
    /// The snake_case name used on disk and in query parameters.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Milestone => "milestone",
            Self::Decision => "decision",
            Self::Action => "action",
            Self::State => "state",
            Self::Detail => "detail",
            Self::System => "system",
        }
    }

    /// Parse a kind from its snake_case name. Returns `None` for unknown
    /// names; callers at the API boundary turn that into a 400.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "milestone" => Some(Self::Milestone),
            "decision" => Some(Self::Decision),
            "action" => Some(Self::Action),
            "state" => Some(Self::State),
            "detail" => Some(Self::Detail),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Payload discriminators
// ---------------------------------------------------------------------------

/// The specific boundary a `MILESTONE` event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneType {
    /// A simulation turn began.
    TurnStart,
    /// A simulation turn completed.
    TurnEnd,
    /// The run moved between phases within a turn.
    PhaseTransition,
    /// The run itself started.
    RunStart,
    /// The run itself ended.
    RunEnd,
}

/// Whether a `STATE` event describes a global or an actor-scoped variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateScope {
    /// A simulation-wide variable.
    Global,
    /// A variable belonging to a single actor.
    Actor,
}

/// Outcome status carried by a `SYSTEM` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    /// The operation completed normally.
    Success,
    /// The operation failed.
    Failure,
    /// The operation is being retried.
    Retry,
    /// The operation completed with a warning.
    Warning,
}

// ---------------------------------------------------------------------------
// Verbosity policy
// ---------------------------------------------------------------------------

/// The configured threshold controlling which event kinds a writer persists.
///
/// Levels are ordered `Milestone < Decision < Action < State < Detail`.
/// A level retains its own kind plus every kind of the levels below it,
/// so the retained-kind sets are nested: anything visible at one level is
/// visible at every higher level. `SYSTEM` events are retained only at
/// [`Verbosity::Detail`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Only run/turn boundary markers.
    Milestone,
    /// Milestones plus agent decisions.
    Decision,
    /// Decisions plus concrete actions. The default.
    #[default]
    Action,
    /// Actions plus state variable transitions.
    State,
    /// Everything, including calculation details and system events.
    Detail,
}

impl Verbosity {
    /// Whether events of `kind` are persisted at this level.
    ///
    /// Evaluated on every `emit` before any queueing or I/O, so it must
    /// stay a branch-only O(1) check.
    pub const fn retains(self, kind: EventKind) -> bool {
        match kind {
            EventKind::Milestone => true,
            EventKind::Decision => {
                matches!(self, Self::Decision | Self::Action | Self::State | Self::Detail)
            }
            EventKind::Action => matches!(self, Self::Action | Self::State | Self::Detail),
            EventKind::State => matches!(self, Self::State | Self::Detail),
            EventKind::Detail | EventKind::System => matches!(self, Self::Detail),
        }
    }
}
