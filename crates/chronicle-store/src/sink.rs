//! The shared write path: append one serialized event per line, rotating
//! the active file when it would grow past its size limit.
//!
//! Exactly one sink owns a run's active file at a time -- the synchronous
//! writer uses it from the calling thread, the background writer from its
//! single worker -- so rotation never races. All failures here are logged
//! and swallowed: a write error discards one event, never propagates.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use chronicle_types::Event;
use tracing::{debug, error, warn};

use crate::error::StoreError;
use crate::layout;

/// Append-only sink for one run's event files.
pub(crate) struct EventSink {
    run_dir: PathBuf,
    file: File,
    /// Size of the active file in bytes, resumed from metadata on open.
    bytes: u64,
    max_bytes: u64,
    /// When set, every append is synced to stable storage before returning.
    sync_each_write: bool,
}

impl EventSink {
    /// Open (or create) the active file for a run directory.
    pub(crate) fn open(
        run_dir: PathBuf,
        max_bytes: u64,
        sync_each_write: bool,
    ) -> Result<Self, StoreError> {
        fs::create_dir_all(&run_dir)?;
        let file = Self::open_active(&run_dir)?;
        let bytes = file.metadata()?.len();
        Ok(Self {
            run_dir,
            file,
            bytes,
            max_bytes,
            sync_each_write,
        })
    }

    fn open_active(run_dir: &Path) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(run_dir.join(layout::ACTIVE_FILE))
    }

    /// Serialize `event` and append it as one newline-terminated line,
    /// rotating first if the line would push the active file past its limit.
    ///
    /// Never fails: serialization and I/O errors discard the event with a
    /// log line carrying its ID.
    pub(crate) fn append(&mut self, event: &Event) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(err) => {
                error!(
                    event_id = %event.id,
                    error = %err,
                    "failed to serialize event; discarding"
                );
                return;
            }
        };
        let line_bytes = u64::try_from(line.len())
            .unwrap_or(u64::MAX)
            .saturating_add(1);

        // An event larger than the limit still lands in an empty file;
        // rotation only triggers once something precedes it.
        if self.bytes > 0 && self.bytes.saturating_add(line_bytes) > self.max_bytes {
            self.rotate();
        }

        if let Err(err) = self.write_line(&line) {
            error!(
                event_id = %event.id,
                error = %err,
                "failed to write event; discarding"
            );
            return;
        }
        self.bytes = self.bytes.saturating_add(line_bytes);
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        if self.sync_each_write {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Rename the active file to a timestamped name and start a fresh one.
    ///
    /// On rename failure the sink keeps appending to the existing,
    /// now-oversized file rather than losing data.
    fn rotate(&mut self) {
        let rotated = self.run_dir.join(layout::rotated_file_name(Utc::now()));
        let active = self.run_dir.join(layout::ACTIVE_FILE);

        if let Err(err) = self.file.sync_all() {
            warn!(error = %err, "failed to sync active file before rotation");
        }
        if let Err(err) = fs::rename(&active, &rotated) {
            warn!(
                error = %err,
                "rotation rename failed; continuing with oversized active file"
            );
            return;
        }
        match Self::open_active(&self.run_dir) {
            Ok(file) => {
                self.file = file;
                self.bytes = 0;
                debug!(rotated = %rotated.display(), "rotated event file");
            }
            Err(err) => {
                // The old handle still points at the renamed file, so
                // appending there loses nothing.
                error!(
                    error = %err,
                    "failed to open fresh active file after rotation"
                );
            }
        }
    }

    /// Final durability point: sync whatever has been appended so far.
    pub(crate) fn finish(&mut self) {
        if let Err(err) = self.file.sync_all() {
            warn!(error = %err, "failed to sync event file on shutdown");
        }
    }
}
