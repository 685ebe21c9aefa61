//! Domain entities: Project → Module → Task → SubTask
//!
//! Each level exclusively owns the next as an ordered sequence. Every entity
//! carries a [`LocalId`] and, once confirmed remotely, a [`RemoteId`].

use crate::ids::{LocalId, RemoteId};
use crate::progress::{aggregate_progress, derive_module_status};
use crate::status::TaskStatus;
use crate::templates::{ModuleTemplate, FALLBACK_COLOR, FALLBACK_KIND, FALLBACK_TEAM};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// No task started
    #[default]
    NotStarted,
    /// Some work done
    InProgress,
    /// All tasks done
    Done,
    /// Soft-deleted
    Archived,
}

/// Module status, derived from its tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    /// No task started
    #[default]
    NotStarted,
    /// Some tasks started or done
    InProgress,
    /// All tasks done
    Done,
}

/// Reconciliation state of a project against the remote platform
///
/// `Syncing` moves to `Synced` on remote confirmation or to `Error` on
/// failure. Both are stable until the next mutation re-enters `Syncing`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState {
    /// Remote confirmation pending
    Syncing,
    /// Matches the remote side as far as we know
    #[default]
    Synced,
    /// Last remote confirmation failed
    Error {
        /// Failure message kept for display
        message: String,
    },
}

impl SyncState {
    /// Error state with a message
    #[inline]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether a remote confirmation is pending
    #[inline]
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        matches!(self, Self::Syncing)
    }

    /// Whether the last confirmation failed
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Error message, if any
    #[inline]
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syncing => f.write_str("syncing"),
            Self::Synced => f.write_str("synced"),
            Self::Error { message } => write!(f, "error: {message}"),
        }
    }
}

/// A project, mirrored as one remote board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Local identifier
    pub id: LocalId,
    /// Remote board identifier
    pub remote_id: Option<RemoteId>,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// External (sales) reference number
    pub external_ref: Option<String>,
    /// Ordered modules
    pub modules: Vec<Module>,
    /// Completion percentage, always derived from task statuses
    pub progress: u8,
    /// Lifecycle status
    pub status: ProjectStatus,
    /// Reconciliation state
    pub sync: SyncState,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last local modification time
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create an empty local project
    #[must_use]
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: LocalId::generate(),
            remote_id: None,
            name: name.into(),
            description: None,
            external_ref: None,
            modules: Vec::new(),
            progress: 0,
            status: ProjectStatus::NotStarted,
            sync: SyncState::Synced,
            created_at: now,
            updated_at: now,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// With external reference
    #[inline]
    #[must_use]
    pub fn with_external_ref(mut self, external_ref: Option<String>) -> Self {
        self.external_ref = external_ref;
        self
    }

    /// With modules; derived fields are recomputed
    #[inline]
    #[must_use]
    pub fn with_modules(mut self, modules: Vec<Module>) -> Self {
        self.modules = modules;
        self.recompute();
        self
    }

    /// Recompute derived fields: module statuses, progress, project status
    ///
    /// Archived projects keep their status.
    pub fn recompute(&mut self) {
        for module in &mut self.modules {
            module.status = derive_module_status(&module.tasks);
        }
        self.progress = aggregate_progress(&self.modules);
        if self.status != ProjectStatus::Archived {
            self.status = ProjectStatus::from_progress(self.progress);
        }
    }

    /// Whether this project exists only locally
    #[inline]
    #[must_use]
    pub fn is_local_only(&self) -> bool {
        self.remote_id.is_none()
    }

    /// Find a module by local id
    #[must_use]
    pub fn module(&self, id: &LocalId) -> Option<&Module> {
        self.modules.iter().find(|m| &m.id == id)
    }

    /// Find a module by local id, mutably
    pub fn module_mut(&mut self, id: &LocalId) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| &m.id == id)
    }

    /// Total number of tasks across modules
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.modules.iter().map(|m| m.tasks.len()).sum()
    }
}

/// A module, mirrored as one remote group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Local identifier
    pub id: LocalId,
    /// Remote group identifier
    pub remote_id: Option<RemoteId>,
    /// Display name (matches a template name when created from one)
    pub name: String,
    /// Classification
    pub kind: String,
    /// Owning team name
    pub team: String,
    /// Display color (hex)
    pub color: String,
    /// Derived status
    pub status: ModuleStatus,
    /// Responsible person
    pub assigned_person: Option<String>,
    /// Ordered tasks
    pub tasks: Vec<Task>,
}

impl Module {
    /// Create an empty module
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        team: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: LocalId::generate(),
            remote_id: None,
            name: name.into(),
            kind: kind.into(),
            team: team.into(),
            color: color.into(),
            status: ModuleStatus::NotStarted,
            assigned_person: None,
            tasks: Vec::new(),
        }
    }

    /// Build a module named `name`, seeded from a template when one matched
    ///
    /// Without a template the fallback kind, team and color apply and the
    /// module starts with no tasks.
    #[must_use]
    pub fn from_template(name: &str, template: Option<&ModuleTemplate>) -> Self {
        match template {
            Some(t) => {
                let mut module = Self::new(name, &t.kind, &t.team, &t.color);
                module.tasks = t
                    .tasks
                    .iter()
                    .map(|def| {
                        let mut task = Task::new(&def.name);
                        task.subtasks = def.subtasks.iter().map(SubTask::new).collect();
                        task
                    })
                    .collect();
                module
            }
            None => Self::new(name, FALLBACK_KIND, FALLBACK_TEAM, FALLBACK_COLOR),
        }
    }

    /// With assigned person
    #[inline]
    #[must_use]
    pub fn with_assigned_person(mut self, person: Option<String>) -> Self {
        self.assigned_person = person;
        self
    }

    /// Find a task by local id
    #[must_use]
    pub fn task(&self, id: &LocalId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Find a task by local id, mutably
    pub fn task_mut(&mut self, id: &LocalId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }
}

/// A task, mirrored as one remote item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Local identifier
    pub id: LocalId,
    /// Remote item identifier
    pub remote_id: Option<RemoteId>,
    /// Display name
    pub name: String,
    /// Status
    pub status: TaskStatus,
    /// Due date
    pub due_date: Option<NaiveDate>,
    /// Ordered sub-tasks
    pub subtasks: Vec<SubTask>,
}

impl Task {
    /// Create a `todo` task
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LocalId::generate(),
            remote_id: None,
            name: name.into(),
            status: TaskStatus::Todo,
            due_date: None,
            subtasks: Vec::new(),
        }
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// With due date
    #[inline]
    #[must_use]
    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    /// Find a sub-task by local id, mutably
    pub fn subtask_mut(&mut self, id: &LocalId) -> Option<&mut SubTask> {
        self.subtasks.iter_mut().find(|s| &s.id == id)
    }
}

/// A sub-task, mirrored as one remote sub-item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    /// Local identifier
    pub id: LocalId,
    /// Remote sub-item identifier
    pub remote_id: Option<RemoteId>,
    /// Display name
    pub name: String,
    /// Status
    pub status: TaskStatus,
    /// Responsible person
    pub assigned_person: Option<String>,
    /// Due date
    pub due_date: Option<NaiveDate>,
}

impl SubTask {
    /// Create a `todo` sub-task
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LocalId::generate(),
            remote_id: None,
            name: name.into(),
            status: TaskStatus::Todo,
            assigned_person: None,
            due_date: None,
        }
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// With assigned person
    #[inline]
    #[must_use]
    pub fn with_assigned_person(mut self, person: Option<String>) -> Self {
        self.assigned_person = person;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TaskDefinition;
    use pretty_assertions::assert_eq;

    fn template() -> ModuleTemplate {
        ModuleTemplate {
            name: "Infrastructure".into(),
            kind: "technical".into(),
            color: "#00c875".into(),
            team: "Platform".into(),
            tasks: vec![
                TaskDefinition::new("Provision"),
                TaskDefinition::new("Harden").with_subtasks(["Firewall", "Backups"]),
            ],
        }
    }

    #[test]
    fn module_from_template_copies_defaults() {
        let module = Module::from_template("Infrastructure", Some(&template()));
        assert_eq!(module.team, "Platform");
        assert_eq!(module.color, "#00c875");
        assert_eq!(module.kind, "technical");
        assert_eq!(module.tasks.len(), 2);
        assert_eq!(module.tasks[1].subtasks.len(), 2);
        assert!(module.tasks.iter().all(|t| t.status == TaskStatus::Todo));
        assert!(module.remote_id.is_none());
    }

    #[test]
    fn module_without_template_uses_fallbacks() {
        let module = Module::from_template("Ad hoc", None);
        assert_eq!(module.color, FALLBACK_COLOR);
        assert_eq!(module.team, FALLBACK_TEAM);
        assert_eq!(module.kind, FALLBACK_KIND);
        assert!(module.tasks.is_empty());
    }

    #[test]
    fn recompute_derives_progress_and_statuses() {
        let mut module = Module::from_template("Infrastructure", Some(&template()));
        module.tasks[0].status = TaskStatus::Done;
        let project = Project::new("p", Utc::now()).with_modules(vec![module]);

        assert_eq!(project.progress, 50);
        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.modules[0].status, ModuleStatus::InProgress);
    }

    #[test]
    fn recompute_keeps_archived_status() {
        let mut project = Project::new("p", Utc::now());
        project.status = ProjectStatus::Archived;
        project.recompute();
        assert_eq!(project.status, ProjectStatus::Archived);
    }

    #[test]
    fn sync_state_serializes_tagged() {
        let json = serde_json::to_value(SyncState::error("boom")).unwrap();
        assert_eq!(json["state"], "error");
        assert_eq!(json["message"], "boom");
        assert_eq!(SyncState::error("boom").error_message(), Some("boom"));
        assert!(SyncState::Syncing.is_syncing());
    }
}
