//! The event envelope, per-kind payloads, and the shared event builder.
//!
//! Every record in a run's activity log is an [`Event`]: a common envelope
//! (id, timestamp, turn, run, causality links) wrapping one of six typed
//! payloads. The payload is a sum type discriminated by a `kind` field on
//! disk -- never a generic untyped map at the boundary -- so each kind's
//! contract is enforced by the type system.
//!
//! Events are constructed through [`EventBuilder`], which assigns the ID and
//! timestamp at creation time. The writer in `chronicle-store` owns
//! persistence only; it never constructs or mutates events.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::{EventKind, MilestoneType, StateScope, SystemStatus};
use crate::ids::{ActorId, EventId, RunId};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A single immutable record in a run's activity log.
///
/// Serialized as one JSON object per line in the run's event files. The
/// payload fields are flattened into the envelope, with the payload's
/// `kind` tag discriminating which per-kind fields are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique, time-ordered event identifier (UUID v7).
    pub id: EventId,
    /// UTC wall-clock time the event was created, microsecond resolution.
    pub timestamp: DateTime<Utc>,
    /// The simulation turn during which the event occurred.
    pub turn_number: u64,
    /// The run this event belongs to, fixed at writer construction.
    pub run_id: RunId,
    /// The acting agent, where the kind's contract calls for one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<ActorId>,
    /// IDs of the events that caused this one. Soft references: they are
    /// never validated at write time, and a dangling entry is tolerated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caused_by: Vec<EventId>,
    /// Optional human-readable one-line description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// The kind-specific payload, flattened into the envelope.
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    /// The kind of this event, derived from its payload.
    pub const fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// The `(timestamp, id)` pair the aggregation layer sorts by.
    ///
    /// The ID breaks timestamp ties deterministically, so a merged stream
    /// has one canonical order regardless of which file each event landed in.
    pub const fn sort_key(&self) -> (DateTime<Utc>, EventId) {
        (self.timestamp, self.id)
    }
}

// ---------------------------------------------------------------------------
// Per-kind payloads
// ---------------------------------------------------------------------------

/// The kind-specific body of an event.
///
/// One variant per [`EventKind`], discriminated on disk by the `kind` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// A run- or turn-level boundary marker. Carries no actor.
    Milestone {
        /// Which boundary this milestone marks.
        milestone_type: MilestoneType,
    },
    /// A choice an agent made. The actor is required on the envelope.
    Decision {
        /// Domain-specific label for the decision (e.g. `"price_update"`).
        decision_type: String,
        /// Value before the decision, if the decision replaced one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_value: Option<Value>,
        /// Value chosen, if the decision produced one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_value: Option<Value>,
    },
    /// A concrete action an agent performed. The actor is required.
    Action {
        /// Domain-specific label for the action (e.g. `"place_order"`).
        action_type: String,
        /// Arbitrary structured action parameters.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        payload: BTreeMap<String, Value>,
    },
    /// A state variable transition, global or actor-scoped.
    State {
        /// Name of the variable that changed.
        variable_name: String,
        /// The value before the transition.
        old_value: Value,
        /// The value after the transition.
        new_value: Value,
        /// Whether the variable is global or belongs to one actor.
        scope: StateScope,
    },
    /// Fine-grained intermediate calculation values. Carries no actor.
    Detail {
        /// Label for the calculation being traced.
        calculation_type: String,
        /// Named intermediate values produced along the way.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        intermediates: BTreeMap<String, Value>,
    },
    /// A subsystem status report. Carries no actor.
    System {
        /// Error classification, when the status reports a problem.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_type: Option<String>,
        /// Outcome status of the reported operation.
        status: SystemStatus,
        /// Retry attempt number, when the status is a retry.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retry_count: Option<u32>,
    },
}

impl EventPayload {
    /// The kind tag of this payload.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Milestone { .. } => EventKind::Milestone,
            Self::Decision { .. } => EventKind::Decision,
            Self::Action { .. } => EventKind::Action,
            Self::State { .. } => EventKind::State,
            Self::Detail { .. } => EventKind::Detail,
            Self::System { .. } => EventKind::System,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Shared factory collaborators use to construct events for one run.
///
/// The builder owns ID and timestamp assignment. It also upholds the
/// per-writer ordering invariant: timestamps it hands out never decrease,
/// even if the wall clock steps backwards between events. The current turn
/// is set once per turn via [`EventBuilder::begin_turn`] rather than passed
/// on every call.
#[derive(Debug)]
pub struct EventBuilder {
    run_id: RunId,
    turn_number: u64,
    last_timestamp: DateTime<Utc>,
}

impl EventBuilder {
    /// Create a builder for the given run, starting at turn 0.
    pub const fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            turn_number: 0,
            last_timestamp: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Set the turn number stamped on subsequently built events.
    pub const fn begin_turn(&mut self, turn_number: u64) {
        self.turn_number = turn_number;
    }

    /// The run this builder stamps onto every event.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Begin a `MILESTONE` event.
    pub fn milestone(&mut self, milestone_type: MilestoneType) -> EventDraft {
        self.draft(EventPayload::Milestone { milestone_type }, None)
    }

    /// Begin a `DECISION` event for the given actor.
    pub fn decision(
        &mut self,
        actor_id: ActorId,
        decision_type: impl Into<String>,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> EventDraft {
        self.draft(
            EventPayload::Decision {
                decision_type: decision_type.into(),
                old_value,
                new_value,
            },
            Some(actor_id),
        )
    }

    /// Begin an `ACTION` event for the given actor.
    pub fn action(
        &mut self,
        actor_id: ActorId,
        action_type: impl Into<String>,
        payload: BTreeMap<String, Value>,
    ) -> EventDraft {
        self.draft(
            EventPayload::Action {
                action_type: action_type.into(),
                payload,
            },
            Some(actor_id),
        )
    }

    /// Begin a `STATE` event. For actor-scoped variables, attach the actor
    /// via [`EventDraft::actor`].
    pub fn state_change(
        &mut self,
        variable_name: impl Into<String>,
        old_value: Value,
        new_value: Value,
        scope: StateScope,
    ) -> EventDraft {
        self.draft(
            EventPayload::State {
                variable_name: variable_name.into(),
                old_value,
                new_value,
                scope,
            },
            None,
        )
    }

    /// Begin a `DETAIL` event.
    pub fn detail(
        &mut self,
        calculation_type: impl Into<String>,
        intermediates: BTreeMap<String, Value>,
    ) -> EventDraft {
        self.draft(
            EventPayload::Detail {
                calculation_type: calculation_type.into(),
                intermediates,
            },
            None,
        )
    }

    /// Begin a `SYSTEM` event.
    pub fn system(
        &mut self,
        status: SystemStatus,
        error_type: Option<String>,
        retry_count: Option<u32>,
    ) -> EventDraft {
        self.draft(
            EventPayload::System {
                error_type,
                status,
                retry_count,
            },
            None,
        )
    }

    fn draft(&mut self, payload: EventPayload, actor_id: Option<ActorId>) -> EventDraft {
        EventDraft {
            event: Event {
                id: EventId::new(),
                timestamp: self.next_timestamp(),
                turn_number: self.turn_number,
                run_id: self.run_id,
                actor_id,
                caused_by: Vec::new(),
                summary: None,
                payload,
            },
        }
    }

    /// Current wall-clock time, clamped so timestamps never decrease
    /// within this builder.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        if now > self.last_timestamp {
            self.last_timestamp = now;
        }
        self.last_timestamp
    }
}

/// An event under construction: payload fixed, optional envelope fields
/// still settable.
#[must_use = "a draft does nothing until built and handed to a writer"]
#[derive(Debug)]
pub struct EventDraft {
    event: Event,
}

impl EventDraft {
    /// Record the events that caused this one.
    pub fn caused_by(mut self, parents: impl IntoIterator<Item = EventId>) -> Self {
        self.event.caused_by.extend(parents);
        self
    }

    /// Attach a one-line human-readable summary.
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.event.summary = Some(summary.into());
        self
    }

    /// Attach the acting agent (used for actor-scoped `STATE` events).
    pub const fn actor(mut self, actor_id: ActorId) -> Self {
        self.event.actor_id = Some(actor_id);
        self
    }

    /// Finish construction and return the immutable event.
    pub fn build(self) -> Event {
        self.event
    }
}
