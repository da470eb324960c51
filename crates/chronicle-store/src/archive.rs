//! Discovery and aggregation over a run's event files.
//!
//! The archive is stateless and read-only per call: it scans a run's
//! directory, merges the active and rotated files into one stream sorted by
//! `(timestamp, id)`, and answers filtered, paginated, and causality
//! queries. It is safe to use concurrently with an in-progress writer -- a
//! query may simply miss the newest few events mid-write.
//!
//! Causality is represented purely via ID references, never an object
//! graph: traversal is an index-lookup walk with a depth budget, so an
//! accidentally cyclic `caused_by` chain terminates instead of looping.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use chronicle_types::{Event, EventId, FilterCriteria, RunId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;
use crate::layout;

/// One run visible under the data root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// The run's identifier (also its directory name).
    pub run_id: RunId,
    /// Number of event lines recorded for the run, malformed lines included.
    pub event_count: u64,
}

/// One page of a filtered event query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPage {
    /// The events on this page, in `(timestamp, id)` order.
    pub events: Vec<Event>,
    /// Total number of events matching the filter, across all pages.
    pub total: usize,
    /// Whether more matching events exist past this page.
    pub has_more: bool,
}

/// The causal neighbourhood of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalityChain {
    /// Events reachable backward through `caused_by`, oldest first.
    pub upstream: Vec<Event>,
    /// Events that reference the target (transitively), oldest first.
    pub downstream: Vec<Event>,
}

/// Read-only access to every run under one data root.
#[derive(Debug, Clone)]
pub struct EventArchive {
    data_dir: PathBuf,
}

impl EventArchive {
    /// Create an archive over the given data root. The directory does not
    /// need to exist yet; a missing root simply means no runs.
    pub const fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// List all runs with their event counts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory scan fails for a reason
    /// other than the data root not existing.
    pub async fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError> {
        let mut dir = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut runs = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Ok(run_id) = name.parse::<RunId>() else {
                // Unrelated directories under the data root are ignored.
                continue;
            };
            let event_count = Self::count_lines(&entry.path()).await?;
            runs.push(RunSummary {
                run_id,
                event_count,
            });
        }
        runs.sort_unstable_by_key(|run| run.run_id);
        Ok(runs)
    }

    /// Load every event of a run, merged across the active and rotated
    /// files and sorted ascending by `(timestamp, id)` -- the ID breaks
    /// timestamp ties deterministically regardless of where file splits
    /// occurred.
    ///
    /// Malformed lines are skipped with a logged warning; the rest of the
    /// file is still processed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RunNotFound`] if the run has no directory, or
    /// [`StoreError::Io`] if a file cannot be read.
    pub async fn load_run(&self, run_id: RunId) -> Result<Vec<Event>, StoreError> {
        let run_dir = layout::run_dir(&self.data_dir, run_id);
        let files = match Self::event_files(&run_dir).await {
            Ok(files) => files,
            Err(StoreError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::RunNotFound(run_id));
            }
            Err(err) => return Err(err),
        };

        let mut events = Vec::new();
        for path in files {
            let contents = tokio::fs::read_to_string(&path).await?;
            for (index, line) in contents.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Event>(line) {
                    Ok(event) => events.push(event),
                    Err(err) => warn!(
                        file = %path.display(),
                        line = index.saturating_add(1),
                        error = %err,
                        "skipping malformed event line"
                    ),
                }
            }
        }
        events.sort_unstable_by_key(Event::sort_key);
        Ok(events)
    }

    /// Filter a run's stream in one pass, then paginate.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::load_run`] errors.
    pub async fn query(
        &self,
        run_id: RunId,
        criteria: &FilterCriteria,
    ) -> Result<EventPage, StoreError> {
        let events = self.load_run(run_id).await?;
        let matching: Vec<Event> = events
            .into_iter()
            .filter(|event| criteria.matches(event))
            .collect();
        let total = matching.len();
        let events: Vec<Event> = matching
            .into_iter()
            .skip(criteria.offset)
            .take(criteria.limit)
            .collect();
        let has_more = criteria.offset.saturating_add(events.len()) < total;
        Ok(EventPage {
            events,
            total,
            has_more,
        })
    }

    /// Fetch a single event by ID.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::load_run`] errors.
    pub async fn get_event(
        &self,
        run_id: RunId,
        event_id: EventId,
    ) -> Result<Option<Event>, StoreError> {
        let events = self.load_run(run_id).await?;
        Ok(events.into_iter().find(|event| event.id == event_id))
    }

    /// Walk the causality chain around an event, at most `max_depth` hops
    /// in each direction.
    ///
    /// Upstream follows `caused_by` backward; downstream scans for events
    /// referencing the target. `caused_by` entries are soft references: a
    /// parent that was never written (dropped, or below verbosity) is
    /// silently omitted from the result rather than reported as an error.
    /// The visited set plus the depth budget make accidental cycles
    /// terminate. Returns `None` if the target event is unknown.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::load_run`] errors.
    pub async fn causality(
        &self,
        run_id: RunId,
        event_id: EventId,
        max_depth: usize,
    ) -> Result<Option<CausalityChain>, StoreError> {
        let events = self.load_run(run_id).await?;

        let by_id: BTreeMap<EventId, &Event> =
            events.iter().map(|event| (event.id, event)).collect();
        if !by_id.contains_key(&event_id) {
            return Ok(None);
        }

        // parent -> children index for the downstream walk.
        let mut children: BTreeMap<EventId, Vec<&Event>> = BTreeMap::new();
        for event in &events {
            for parent in &event.caused_by {
                children.entry(*parent).or_default().push(event);
            }
        }

        let mut upstream: Vec<Event> = walk(event_id, max_depth, |id| {
            by_id.get(&id).map_or_else(Vec::new, |event| {
                event
                    .caused_by
                    .iter()
                    .filter_map(|parent| by_id.get(parent).copied())
                    .collect()
            })
        })
        .into_iter()
        .cloned()
        .collect();

        let mut downstream: Vec<Event> = walk(event_id, max_depth, |id| {
            children.get(&id).cloned().unwrap_or_default()
        })
        .into_iter()
        .cloned()
        .collect();

        upstream.sort_unstable_by_key(Event::sort_key);
        downstream.sort_unstable_by_key(Event::sort_key);
        Ok(Some(CausalityChain {
            upstream,
            downstream,
        }))
    }

    /// Every event file (active + rotated) in a run directory.
    async fn event_files(run_dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
        let mut dir = tokio::fs::read_dir(run_dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if layout::is_event_file(name) {
                files.push(entry.path());
            }
        }
        files.sort_unstable();
        Ok(files)
    }

    async fn count_lines(run_dir: &Path) -> Result<u64, StoreError> {
        let mut count = 0u64;
        for path in Self::event_files(run_dir).await? {
            let contents = tokio::fs::read_to_string(&path).await?;
            let lines = contents.lines().filter(|line| !line.trim().is_empty()).count();
            count = count.saturating_add(u64::try_from(lines).unwrap_or(u64::MAX));
        }
        Ok(count)
    }
}

/// Breadth-first traversal from `start`, bounded by `max_depth` hops.
///
/// `neighbours` yields the next ring of events for one ID. The visited set
/// guarantees termination even when the reference graph contains cycles.
fn walk<'a>(
    start: EventId,
    max_depth: usize,
    neighbours: impl Fn(EventId) -> Vec<&'a Event>,
) -> Vec<&'a Event> {
    let mut visited: BTreeSet<EventId> = BTreeSet::new();
    visited.insert(start);
    let mut frontier = vec![start];
    let mut collected: Vec<&Event> = Vec::new();

    let mut depth = 0usize;
    while depth < max_depth && !frontier.is_empty() {
        let mut next = Vec::new();
        for id in frontier {
            for event in neighbours(id) {
                if visited.insert(event.id) {
                    collected.push(event);
                    next.push(event.id);
                }
            }
        }
        frontier = next;
        depth = depth.saturating_add(1);
    }
    collected
}
