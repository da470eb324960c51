//! Durable event persistence for the Chronicle subsystem.
//!
//! This crate owns the write and read paths of the activity log. Events are
//! appended to newline-delimited JSON files, one directory per run, with
//! size-based rotation. The write side is the dual-mode [`EventWriter`]; the
//! read side is the stateless [`EventArchive`] that merges all of a run's
//! files back into one ordered stream.
//!
//! # Architecture
//!
//! ```text
//! Collaborator
//!     |
//!     +-- emit() ----------> EventWriter (verbosity gate)
//!         |-- background --> bounded queue --> worker --> EventSink
//!         +-- synchronous -----------------------------> EventSink
//!                                                            |
//!                             <data_dir>/<run_id>/events*.jsonl
//!                                                            |
//!     Query API <-- EventArchive (merge, filter, causality) -+
//! ```
//!
//! # Modules
//!
//! - [`layout`] -- On-disk naming for active and rotated event files
//! - [`sink`] -- The shared append/rotate write path (crate-private)
//! - [`writer`] -- The dual-mode event writer
//! - [`archive`] -- Discovery, aggregation, filtering, causality traversal
//! - [`error`] -- Shared error types

pub mod archive;
pub mod error;
pub mod layout;
mod sink;
pub mod writer;

// Re-export primary types for convenience.
pub use archive::{CausalityChain, EventArchive, EventPage, RunSummary};
pub use error::StoreError;
pub use writer::{EventWriter, StopReport, WriteMode, WriterConfig};
