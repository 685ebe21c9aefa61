//! Remote records → domain entities
//!
//! Shared by the blocking load, background refresh and per-project refresh.
//! Board → [`Project`], group → [`Module`], item → [`Task`], sub-item →
//! [`SubTask`]. Remote order is preserved at every level and derived fields
//! are computed last.

use boardsync_model::{
    map_status, LocalId, Module, Project, ProjectStatus, SubTask, SyncState, Task,
    TemplateLookup, FALLBACK_COLOR, FALLBACK_KIND, FALLBACK_TEAM,
};
use boardsync_remote::{BoardRecord, BoardState, GroupRecord, ItemRecord, SubitemRecord};
use chrono::{DateTime, Utc};

/// Transform every project board; archived, deleted and sub-item boards
/// are skipped
#[must_use]
pub fn projects_from_boards(
    boards: &[BoardRecord],
    templates: &dyn TemplateLookup,
    now: DateTime<Utc>,
) -> Vec<Project> {
    boards
        .iter()
        .filter(|b| b.is_project_board())
        .map(|b| project_from_board(b, templates, now))
        .collect()
}

/// Transform one board
///
/// A non-active board yields an archived project.
#[must_use]
pub fn project_from_board(
    board: &BoardRecord,
    templates: &dyn TemplateLookup,
    now: DateTime<Utc>,
) -> Project {
    let mut project = Project {
        id: LocalId::generate(),
        remote_id: Some(board.id.clone()),
        name: board.name.clone(),
        description: board.description.clone(),
        external_ref: board.external_ref.clone(),
        modules: board
            .groups
            .iter()
            .map(|g| module_from_group(g, templates))
            .collect(),
        progress: 0,
        status: ProjectStatus::NotStarted,
        sync: SyncState::Synced,
        created_at: now,
        updated_at: now,
    };
    if board.state != BoardState::Active {
        project.status = ProjectStatus::Archived;
    }
    project.recompute();
    project
}

fn module_from_group(group: &GroupRecord, templates: &dyn TemplateLookup) -> Module {
    let template = templates.find_by_name(&group.title);
    let (kind, team, color) = match &template {
        Some(t) => (t.kind.as_str(), t.team.as_str(), t.color.as_str()),
        None => (FALLBACK_KIND, FALLBACK_TEAM, FALLBACK_COLOR),
    };

    let mut module = Module::new(&group.title, kind, team, color);
    module.remote_id = Some(group.id.clone());
    module.tasks = group.items.iter().map(task_from_item).collect();
    module
}

fn task_from_item(item: &ItemRecord) -> Task {
    let mut task = Task::new(&item.name)
        .with_status(map_status(item.status_text.as_deref().unwrap_or_default()))
        .with_due_date(item.due_date);
    task.remote_id = Some(item.id.clone());
    task.subtasks = item.subitems.iter().map(subtask_from_subitem).collect();
    task
}

fn subtask_from_subitem(subitem: &SubitemRecord) -> SubTask {
    let mut subtask = SubTask::new(&subitem.name)
        .with_status(map_status(subitem.status_text.as_deref().unwrap_or_default()))
        .with_assigned_person(subitem.person.clone());
    subtask.due_date = subitem.due_date;
    subtask.remote_id = Some(subitem.id.clone());
    subtask
}
