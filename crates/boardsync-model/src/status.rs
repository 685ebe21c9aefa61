//! Status mapping from raw remote column text
//!
//! Remote status columns are free text, in English or French. Matching is a
//! case-insensitive substring check in fixed priority order: a "done" synonym
//! always wins over an "in progress" synonym, and anything else is `todo`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Synonyms that mark a task as finished
const DONE_SYNONYMS: &[&str] = &["done", "completed", "terminé", "termine"];

/// Synonyms that mark a task as started
const IN_PROGRESS_SYNONYMS: &[&str] = &["in progress", "en cours", "working on it"];

/// Task status as tracked locally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Todo,
    /// Started, not finished
    InProgress,
    /// Finished
    Done,
}

impl TaskStatus {
    /// Points contributed to project progress
    #[inline]
    #[must_use]
    pub const fn progress_points(self) -> u32 {
        match self {
            Self::Todo => 0,
            Self::InProgress => 50,
            Self::Done => 100,
        }
    }

    /// Label written back to the remote status column
    ///
    /// Each label maps back to the same status through [`map_status`].
    #[inline]
    #[must_use]
    pub const fn remote_label(self) -> &'static str {
        match self {
            Self::Todo => "Not Started",
            Self::InProgress => "Working on it",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Map raw remote status text to a [`TaskStatus`]
///
/// Total: every input maps to exactly one status.
#[must_use]
pub fn map_status(raw: &str) -> TaskStatus {
    let text = raw.to_lowercase();

    if DONE_SYNONYMS.iter().any(|s| text.contains(s)) {
        TaskStatus::Done
    } else if IN_PROGRESS_SYNONYMS.iter().any(|s| text.contains(s)) {
        TaskStatus::InProgress
    } else {
        TaskStatus::Todo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn done_synonyms_any_case() {
        assert_eq!(map_status("Done"), TaskStatus::Done);
        assert_eq!(map_status("DONE"), TaskStatus::Done);
        assert_eq!(map_status("Completed"), TaskStatus::Done);
        assert_eq!(map_status("Terminé"), TaskStatus::Done);
        assert_eq!(map_status("TERMINÉ"), TaskStatus::Done);
        assert_eq!(map_status("tâche terminee"), TaskStatus::Done);
    }

    #[test]
    fn in_progress_synonyms() {
        assert_eq!(map_status("In Progress"), TaskStatus::InProgress);
        assert_eq!(map_status("En cours"), TaskStatus::InProgress);
        assert_eq!(map_status("Working on it"), TaskStatus::InProgress);
    }

    #[test]
    fn done_wins_over_in_progress() {
        assert_eq!(map_status("in progress - done"), TaskStatus::Done);
        assert_eq!(map_status("En cours (terminé)"), TaskStatus::Done);
    }

    #[test]
    fn unknown_text_defaults_to_todo() {
        assert_eq!(map_status(""), TaskStatus::Todo);
        assert_eq!(map_status("Stuck"), TaskStatus::Todo);
        assert_eq!(map_status("progress"), TaskStatus::Todo);
    }

    #[test]
    fn remote_labels_round_trip() {
        for status in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done] {
            assert_eq!(map_status(status.remote_label()), status);
        }
    }

    proptest! {
        #[test]
        fn mapping_is_idempotent(raw in ".*") {
            let first = map_status(&raw);
            prop_assert_eq!(map_status(first.remote_label()), first);
            prop_assert_eq!(map_status(&raw), first);
        }

        #[test]
        fn done_marker_always_maps_to_done(prefix in "[a-z ]{0,8}", suffix in "[a-z ]{0,8}") {
            let raw = format!("{prefix}CoMpLeTeD{suffix}");
            prop_assert_eq!(map_status(&raw), TaskStatus::Done);
        }
    }
}
