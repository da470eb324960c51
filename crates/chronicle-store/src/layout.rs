//! On-disk naming conventions for run event files.
//!
//! Each run owns one directory named after its run ID under the data root.
//! Inside it, the writer appends to `events.jsonl` and renames that file to
//! a microsecond-timestamped name on rotation. Discovery treats every file
//! matching these names as part of the run's logical stream.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use chronicle_types::RunId;

/// Name of the file the writer is currently appending to.
pub const ACTIVE_FILE: &str = "events.jsonl";

const FILE_PREFIX: &str = "events_";
const FILE_SUFFIX: &str = ".jsonl";

/// The directory holding all event files for a run.
pub fn run_dir(data_dir: &Path, run_id: RunId) -> PathBuf {
    data_dir.join(run_id.to_string())
}

/// The name a rotated file receives, derived from the rotation instant.
///
/// Microsecond precision keeps successive rotations from colliding: a
/// single writer cannot rename the active file twice within one microsecond.
pub fn rotated_file_name(at: DateTime<Utc>) -> String {
    format!("{FILE_PREFIX}{}{FILE_SUFFIX}", at.format("%Y-%m-%d_%H-%M-%S-%6f"))
}

/// Whether a file name belongs to the run's event stream (active or rotated).
pub fn is_event_file(name: &str) -> bool {
    name == ACTIVE_FILE || (name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rotated_names_carry_date_and_microseconds() {
        let at = Utc
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 22)
            .single()
            .and_then(|dt| dt.checked_add_signed(chrono::Duration::microseconds(123_456)));
        let name = rotated_file_name(at.unwrap_or_default());
        assert_eq!(name, "events_2024-03-09_14-05-22-123456.jsonl");
    }

    #[test]
    fn event_file_predicate_accepts_active_and_rotated() {
        assert!(is_event_file(ACTIVE_FILE));
        assert!(is_event_file("events_2024-03-09_14-05-22-123456.jsonl"));
        assert!(!is_event_file("snapshot.jsonl"));
        assert!(!is_event_file("events_2024-03-09.tmp"));
    }

    #[test]
    fn run_dir_is_named_after_the_run() {
        let run_id = RunId::new();
        let dir = run_dir(Path::new("/var/data"), run_id);
        assert!(dir.ends_with(run_id.to_string()));
    }
}
