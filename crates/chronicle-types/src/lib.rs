//! Shared type definitions for the Chronicle event streaming subsystem.
//!
//! This crate is the single source of truth for the event model used across
//! the Chronicle workspace: typed identifiers, the event envelope with its
//! per-kind payload, the verbosity policy, and query-side filter criteria.
//! Collaborators (the simulation engine, agents, validators) construct
//! events through [`EventBuilder`]; the writer in `chronicle-store` owns
//! persistence only and never constructs events itself.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID v7 wrappers for entity identifiers
//! - [`enums`] -- Event kinds, milestone/system/state enums, verbosity levels
//! - [`event`] -- The event envelope, per-kind payloads, and the builder
//! - [`filter`] -- Query-side filter criteria (never persisted)

pub mod enums;
pub mod event;
pub mod filter;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{EventKind, MilestoneType, StateScope, SystemStatus, Verbosity};
pub use event::{Event, EventBuilder, EventDraft, EventPayload};
pub use filter::FilterCriteria;
pub use ids::{ActorId, EventId, RunId};
