//! Request types for engine operations
//!
//! Change sets use `None` for "leave untouched"; optional fields that can be
//! cleared use `Some(None)`.

use boardsync_model::{Module, SubTask, Task, TaskStatus};
use boardsync_remote::{GroupChanges, ItemChanges, SubitemChanges};
use chrono::NaiveDate;

/// A project to create
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// External (sales) reference number
    pub external_ref: Option<String>,
    /// Names of the modules to create, resolved against the templates
    pub modules: Vec<String>,
}

impl NewProject {
    /// Project named `name` with no modules
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With external reference
    #[must_use]
    pub fn with_external_ref(mut self, external_ref: impl Into<String>) -> Self {
        self.external_ref = Some(external_ref.into());
        self
    }

    /// With modules
    #[must_use]
    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules = modules.into_iter().map(Into::into).collect();
        self
    }
}

/// A module to add to an existing project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewModule {
    /// Module name, resolved against the templates
    pub name: String,
    /// Responsible person
    pub assigned_person: Option<String>,
}

impl NewModule {
    /// Module named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            assigned_person: None,
        }
    }

    /// With assigned person
    #[must_use]
    pub fn with_assigned_person(mut self, person: impl Into<String>) -> Self {
        self.assigned_person = Some(person.into());
        self
    }
}

/// Changes to a module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleChanges {
    pub name: Option<String>,
    pub color: Option<String>,
    pub team: Option<String>,
    pub kind: Option<String>,
    pub assigned_person: Option<Option<String>>,
}

impl ModuleChanges {
    pub(crate) fn apply_to(&self, module: &mut Module) {
        if let Some(name) = &self.name {
            module.name.clone_from(name);
        }
        if let Some(color) = &self.color {
            module.color.clone_from(color);
        }
        if let Some(team) = &self.team {
            module.team.clone_from(team);
        }
        if let Some(kind) = &self.kind {
            module.kind.clone_from(kind);
        }
        if let Some(person) = &self.assigned_person {
            module.assigned_person.clone_from(person);
        }
    }

    /// The part of the change the remote group carries
    pub(crate) fn group_changes(&self) -> GroupChanges {
        GroupChanges {
            title: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

/// A task to add to a module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    /// Task named `name`, not started
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// With status
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// With due date
    #[must_use]
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Changes to a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub name: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskChanges {
    /// Status change only
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name.clone_from(name);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
    }

    pub(crate) fn item_changes(&self) -> ItemChanges {
        ItemChanges {
            name: self.name.clone(),
            status_label: self.status.map(|s| s.remote_label().to_string()),
            due_date: self.due_date,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.name.is_none() && self.status.is_none() && self.due_date.is_none()
    }
}

/// A sub-task to add to a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSubTask {
    pub name: String,
    pub status: TaskStatus,
    pub assigned_person: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl NewSubTask {
    /// Sub-task named `name`, not started
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// With status
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// With assigned person
    #[must_use]
    pub fn with_assigned_person(mut self, person: impl Into<String>) -> Self {
        self.assigned_person = Some(person.into());
        self
    }
}

/// Changes to a sub-task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubTaskChanges {
    pub name: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_person: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl SubTaskChanges {
    /// Status change only
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn apply_to(&self, subtask: &mut SubTask) {
        if let Some(name) = &self.name {
            subtask.name.clone_from(name);
        }
        if let Some(status) = self.status {
            subtask.status = status;
        }
        if let Some(person) = &self.assigned_person {
            subtask.assigned_person.clone_from(person);
        }
        if let Some(due) = self.due_date {
            subtask.due_date = due;
        }
    }

    pub(crate) fn subitem_changes(&self) -> SubitemChanges {
        SubitemChanges {
            name: self.name.clone(),
            status_label: self.status.map(|s| s.remote_label().to_string()),
            person: self.assigned_person.clone(),
            due_date: self.due_date,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.assigned_person.is_none()
            && self.due_date.is_none()
    }
}
