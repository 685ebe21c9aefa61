//! Progress aggregation
//!
//! Project progress is a coarse two-tier model: every task counts the same,
//! done = 100, in progress = 50, todo = 0, averaged over all tasks of all
//! modules. Sub-tasks are informational and do not move the aggregate.

use crate::entities::{Module, ModuleStatus, ProjectStatus, Task};
use crate::status::TaskStatus;

/// Compute completion percentage (0-100) over all tasks of all modules
///
/// Returns 0 when there are no tasks. Halves round up.
#[must_use]
pub fn aggregate_progress(modules: &[Module]) -> u8 {
    aggregate_statuses(
        modules
            .iter()
            .flat_map(|m| m.tasks.iter())
            .map(|t| t.status),
    )
}

/// Compute completion percentage over a flat sequence of task statuses
#[must_use]
pub fn aggregate_statuses(statuses: impl IntoIterator<Item = TaskStatus>) -> u8 {
    let (count, points) = statuses
        .into_iter()
        .fold((0u64, 0u64), |(count, points), status| {
            (count + 1, points + u64::from(status.progress_points()))
        });

    if count == 0 {
        return 0;
    }

    // round(points / count) with halves rounding up
    let rounded = (2 * points + count) / (2 * count);
    u8::try_from(rounded).unwrap_or(100)
}

/// Derive a module's status from its tasks
#[must_use]
pub fn derive_module_status(tasks: &[Task]) -> ModuleStatus {
    if tasks.is_empty() || tasks.iter().all(|t| t.status == TaskStatus::Todo) {
        ModuleStatus::NotStarted
    } else if tasks.iter().all(|t| t.status == TaskStatus::Done) {
        ModuleStatus::Done
    } else {
        ModuleStatus::InProgress
    }
}

impl ProjectStatus {
    /// Derive status from an aggregated progress value
    #[inline]
    #[must_use]
    pub fn from_progress(progress: u8) -> Self {
        match progress {
            0 => Self::NotStarted,
            100..=u8::MAX => Self::Done,
            _ => Self::InProgress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn module_with(statuses: &[TaskStatus]) -> Module {
        let mut module = Module::new("m", "custom", "General", "#579bfc");
        module.tasks = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| Task::new(format!("t{i}")).with_status(*s))
            .collect();
        module
    }

    #[test]
    fn empty_project_has_zero_progress() {
        assert_eq!(aggregate_progress(&[]), 0);
        assert_eq!(aggregate_progress(&[module_with(&[])]), 0);
    }

    #[test]
    fn reference_values() {
        use TaskStatus::{Done, InProgress, Todo};
        assert_eq!(aggregate_progress(&[module_with(&[Done])]), 100);
        assert_eq!(aggregate_progress(&[module_with(&[Done, Todo])]), 50);
        assert_eq!(aggregate_progress(&[module_with(&[InProgress, InProgress])]), 50);
    }

    #[test]
    fn flattens_across_modules() {
        use TaskStatus::{Done, Todo};
        let modules = [module_with(&[Done]), module_with(&[Todo, Todo])];
        // 100 / 3 = 33.3
        assert_eq!(aggregate_progress(&modules), 33);
    }

    #[test]
    fn rounds_halves_up() {
        use TaskStatus::{Done, InProgress, Todo};
        // (50 + 0 + 0 + 0) / 4 = 12.5
        assert_eq!(aggregate_statuses([InProgress, Todo, Todo, Todo]), 13);
        // (100 + 100 + 50) / 3 = 83.3
        assert_eq!(aggregate_statuses([Done, Done, InProgress]), 83);
    }

    #[test]
    fn subtasks_do_not_affect_progress() {
        let mut module = module_with(&[TaskStatus::Todo]);
        module.tasks[0]
            .subtasks
            .push(crate::SubTask::new("s").with_status(TaskStatus::Done));
        assert_eq!(aggregate_progress(&[module]), 0);
    }

    #[test]
    fn module_status_derivation() {
        use TaskStatus::{Done, InProgress, Todo};
        assert_eq!(derive_module_status(&[]), ModuleStatus::NotStarted);
        assert_eq!(derive_module_status(&module_with(&[Todo, Todo]).tasks), ModuleStatus::NotStarted);
        assert_eq!(derive_module_status(&module_with(&[Todo, Done]).tasks), ModuleStatus::InProgress);
        assert_eq!(derive_module_status(&module_with(&[InProgress]).tasks), ModuleStatus::InProgress);
        assert_eq!(derive_module_status(&module_with(&[Done, Done]).tasks), ModuleStatus::Done);
    }

    #[test]
    fn project_status_from_progress() {
        assert_eq!(ProjectStatus::from_progress(0), ProjectStatus::NotStarted);
        assert_eq!(ProjectStatus::from_progress(1), ProjectStatus::InProgress);
        assert_eq!(ProjectStatus::from_progress(99), ProjectStatus::InProgress);
        assert_eq!(ProjectStatus::from_progress(100), ProjectStatus::Done);
    }

    fn any_status() -> impl Strategy<Value = TaskStatus> {
        prop_oneof![
            Just(TaskStatus::Todo),
            Just(TaskStatus::InProgress),
            Just(TaskStatus::Done),
        ]
    }

    proptest! {
        #[test]
        fn progress_is_bounded(statuses in proptest::collection::vec(any_status(), 0..64)) {
            let progress = aggregate_statuses(statuses.iter().copied());
            prop_assert!(progress <= 100);
            if statuses.iter().all(|s| *s == TaskStatus::Done) && !statuses.is_empty() {
                prop_assert_eq!(progress, 100);
            }
            if statuses.iter().all(|s| *s == TaskStatus::Todo) {
                prop_assert_eq!(progress, 0);
            }
        }
    }
}
