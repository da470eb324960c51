//! The dual-mode event writer.
//!
//! A writer is constructed per run with an **explicit** [`WriteMode`] --
//! never inferred from execution context. The two modes exist because the
//! host control loop may be blocking code that never yields to a cooperative
//! scheduler; a writer whose durability depends on the code it is
//! instrumenting yielding control is the failure this design rules out:
//!
//! - [`WriteMode::Background`]: `emit` pushes onto a bounded queue without
//!   blocking, and a dedicated worker drains it to disk. On a full queue the
//!   event is dropped and counted. Choosing this mode inside a host loop
//!   that never yields is a caller error this writer intentionally does not
//!   auto-correct.
//! - [`WriteMode::Synchronous`]: `emit` performs the durable write itself
//!   and returns once the line is synced to stable storage. No queue, no
//!   worker, no dependence on a scheduler.
//!
//! In both modes `emit` is infallible: every failure path degrades
//! observability, never the host simulation.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chronicle_types::{Event, RunId, Verbosity};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::layout;
use crate::sink::EventSink;

/// Default size limit for the active event file before rotation (500 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Default capacity of the background-mode queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Dropped events are logged once per this many drops, not per drop.
const DROP_LOG_INTERVAL: u64 = 100;

/// How `emit` persists events. Chosen once at construction, never switched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Non-blocking `emit` onto a bounded queue, drained by a worker.
    Background,
    /// `emit` writes and syncs on the calling thread before returning.
    Synchronous,
}

/// Configuration for an [`EventWriter`].
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Root directory holding one subdirectory per run.
    pub data_dir: PathBuf,
    /// The run this writer persists; fixed for the writer's lifetime.
    pub run_id: RunId,
    /// Which event kinds are persisted.
    pub verbosity: Verbosity,
    /// Size threshold at which the active file is rotated.
    pub max_file_size: u64,
    /// Queue capacity in background mode; ignored in synchronous mode.
    pub queue_capacity: usize,
    /// The persistence mode. Explicit by design.
    pub mode: WriteMode,
}

impl WriterConfig {
    /// Create a configuration with default verbosity, file size, and
    /// queue capacity.
    pub fn new(data_dir: impl Into<PathBuf>, run_id: RunId, mode: WriteMode) -> Self {
        Self {
            data_dir: data_dir.into(),
            run_id,
            verbosity: Verbosity::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            mode,
        }
    }

    /// Set the verbosity level.
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the rotation size threshold.
    #[must_use]
    pub const fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Set the background-mode queue capacity.
    #[must_use]
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}

/// Outcome of [`EventWriter::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopReport {
    /// Events accepted into the queue but not yet written when the stop
    /// deadline passed. Always 0 in synchronous mode.
    pub unflushed: u64,
}

enum Inner {
    Background {
        /// Held until `start` moves it into the worker.
        sink: Option<EventSink>,
        tx: Option<mpsc::Sender<Event>>,
        worker: Option<JoinHandle<()>>,
        queue_capacity: usize,
        /// Events accepted but not yet written.
        in_flight: Arc<AtomicU64>,
        /// Monotonic count of events dropped at the queue boundary.
        dropped: Arc<AtomicU64>,
        /// Set by `stop` past its deadline to make the worker exit.
        cancel: Arc<AtomicBool>,
    },
    Synchronous {
        sink: Mutex<EventSink>,
    },
}

/// Persists events for exactly one run.
///
/// Owned by the run's orchestrator and injected into collaborators -- never
/// a process-wide singleton. Its lifecycle is tied one-to-one to the run:
/// construct at run start, [`stop`](Self::stop) at run end.
pub struct EventWriter {
    run_id: RunId,
    verbosity: Verbosity,
    inner: Inner,
}

impl EventWriter {
    /// Create a writer, opening the run's active event file.
    ///
    /// In background mode the worker is not yet running; call
    /// [`start`](Self::start) before emitting.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the run directory or active file
    /// cannot be created.
    pub fn new(config: WriterConfig) -> Result<Self, StoreError> {
        let run_dir = layout::run_dir(&config.data_dir, config.run_id);
        let inner = match config.mode {
            WriteMode::Synchronous => Inner::Synchronous {
                // Sync every write: emit's contract is durability on return.
                sink: Mutex::new(EventSink::open(run_dir, config.max_file_size, true)?),
            },
            WriteMode::Background => Inner::Background {
                sink: Some(EventSink::open(run_dir, config.max_file_size, false)?),
                tx: None,
                worker: None,
                queue_capacity: config.queue_capacity,
                in_flight: Arc::default(),
                dropped: Arc::default(),
                cancel: Arc::default(),
            },
        };
        Ok(Self {
            run_id: config.run_id,
            verbosity: config.verbosity,
            inner,
        })
    }

    /// Launch the background worker. A no-op in synchronous mode.
    ///
    /// Must be called from within a Tokio runtime: the worker runs on the
    /// blocking pool so its file I/O never competes with async tasks.
    pub fn start(&mut self) {
        let Inner::Background {
            sink,
            tx,
            worker,
            queue_capacity,
            in_flight,
            cancel,
            ..
        } = &mut self.inner
        else {
            return;
        };
        if worker.is_some() {
            warn!(run_id = %self.run_id, "writer already started");
            return;
        }
        let Some(mut sink) = sink.take() else {
            warn!(run_id = %self.run_id, "writer cannot be restarted after stop");
            return;
        };

        // A zero capacity would be rejected by the channel; treat it as 1.
        let (sender, mut receiver) = mpsc::channel((*queue_capacity).max(1));
        *tx = Some(sender);
        let in_flight = Arc::clone(in_flight);
        let cancel = Arc::clone(cancel);
        *worker = Some(tokio::task::spawn_blocking(move || {
            while let Some(event) = receiver.blocking_recv() {
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                sink.append(&event);
                in_flight.fetch_sub(1, Ordering::AcqRel);
            }
            sink.finish();
        }));
        info!(run_id = %self.run_id, "event writer worker started");
    }

    /// Persist `event`, subject to the verbosity policy.
    ///
    /// Infallible by contract. In background mode this never blocks: a full
    /// queue drops the event and increments the drop counter, with a
    /// throttled warning (one per hundred drops) rather than one per drop.
    /// In synchronous mode this returns once the line is synced to stable
    /// storage.
    pub fn emit(&self, event: Event) {
        if !self.verbosity.retains(event.kind()) {
            return;
        }
        match &self.inner {
            Inner::Synchronous { sink } => {
                let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
                sink.append(&event);
            }
            Inner::Background {
                tx: Some(tx),
                in_flight,
                dropped,
                ..
            } => {
                in_flight.fetch_add(1, Ordering::AcqRel);
                if let Err(err) = tx.try_send(event) {
                    in_flight.fetch_sub(1, Ordering::AcqRel);
                    self.record_drop(dropped, &err);
                }
            }
            Inner::Background { dropped, .. } => {
                // No worker running: accepted events could never flush.
                let count = dropped.fetch_add(1, Ordering::AcqRel).saturating_add(1);
                if count % DROP_LOG_INTERVAL == 1 {
                    warn!(
                        run_id = %self.run_id,
                        dropped_total = count,
                        "writer has no running worker; dropping event"
                    );
                }
            }
        }
    }

    fn record_drop(&self, dropped: &AtomicU64, err: &TrySendError<Event>) {
        let count = dropped.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        if count % DROP_LOG_INTERVAL != 1 {
            return;
        }
        match err {
            TrySendError::Full(event) => warn!(
                run_id = %self.run_id,
                event_id = %event.id,
                dropped_total = count,
                "event queue full; dropping event"
            ),
            TrySendError::Closed(event) => warn!(
                run_id = %self.run_id,
                event_id = %event.id,
                dropped_total = count,
                "writer is stopping; dropping event"
            ),
        }
    }

    /// Stop the writer, draining the queue for up to `timeout`.
    ///
    /// Background mode: intake closes immediately; the worker finishes
    /// whatever is queued. Past the deadline the worker is told to exit and
    /// the count of events left unwritten is reported -- reported, never
    /// hidden. Synchronous mode: every emitted event is already durable, so
    /// this returns at once.
    pub async fn stop(self, timeout: Duration) -> StopReport {
        match self.inner {
            Inner::Synchronous { sink } => {
                drop(sink);
                StopReport { unflushed: 0 }
            }
            Inner::Background {
                tx,
                worker,
                in_flight,
                cancel,
                ..
            } => {
                // Closing the channel stops intake and lets the worker
                // drain to completion.
                drop(tx);
                let Some(worker) = worker else {
                    return StopReport { unflushed: 0 };
                };
                match tokio::time::timeout(timeout, worker).await {
                    Ok(join_result) => {
                        if let Err(err) = join_result {
                            warn!(
                                run_id = %self.run_id,
                                error = %err,
                                "writer worker terminated abnormally"
                            );
                        }
                        StopReport {
                            unflushed: in_flight.load(Ordering::Acquire),
                        }
                    }
                    Err(_elapsed) => {
                        cancel.store(true, Ordering::Relaxed);
                        let unflushed = in_flight.load(Ordering::Acquire);
                        warn!(
                            run_id = %self.run_id,
                            unflushed,
                            "stop deadline passed; abandoning queued events"
                        );
                        StopReport { unflushed }
                    }
                }
            }
        }
    }

    /// The run this writer persists.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// The configured verbosity level.
    pub const fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// The writer's persistence mode.
    pub const fn mode(&self) -> WriteMode {
        match self.inner {
            Inner::Background { .. } => WriteMode::Background,
            Inner::Synchronous { .. } => WriteMode::Synchronous,
        }
    }

    /// Total events dropped at the queue boundary so far. Always 0 in
    /// synchronous mode.
    pub fn dropped(&self) -> u64 {
        match &self.inner {
            Inner::Background { dropped, .. } => dropped.load(Ordering::Acquire),
            Inner::Synchronous { .. } => 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chronicle_types::{EventBuilder, MilestoneType};

    #[test]
    fn config_defaults_match_contract() {
        let config = WriterConfig::new("/tmp/x", RunId::new(), WriteMode::Background);
        assert_eq!(config.max_file_size, 500 * 1024 * 1024);
        assert_eq!(config.queue_capacity, 10_000);
        assert_eq!(config.verbosity, Verbosity::Action);
    }

    #[test]
    fn emit_before_start_counts_drops() {
        let dir = tempfile::tempdir().unwrap();
        let writer = EventWriter::new(WriterConfig::new(
            dir.path(),
            RunId::new(),
            WriteMode::Background,
        ))
        .unwrap();

        let mut builder = EventBuilder::new(writer.run_id());
        writer.emit(builder.milestone(MilestoneType::RunStart).build());
        writer.emit(builder.milestone(MilestoneType::RunEnd).build());
        assert_eq!(writer.dropped(), 2);
    }

    #[test]
    fn filtered_events_are_not_counted_as_drops() {
        let dir = tempfile::tempdir().unwrap();
        let writer = EventWriter::new(WriterConfig::new(
            dir.path(),
            RunId::new(),
            WriteMode::Background,
        ))
        .unwrap();

        // DETAIL is below the default ACTION verbosity: filtered out before
        // the queue is ever consulted.
        let mut builder = EventBuilder::new(writer.run_id());
        writer.emit(builder.detail("noise", std::collections::BTreeMap::new()).build());
        assert_eq!(writer.dropped(), 0);
    }
}
