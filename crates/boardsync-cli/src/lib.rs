//! boardsync command implementations
//!
//! Each command renders to a `String` so the binary only prints.

#![warn(unreachable_pub)]

use anyhow::{bail, Context, Result};
use boardsync_core::{FileStore, PersistedState, PersistenceAdapter};
use boardsync_model::{map_status, Project, ProjectStatus, StaticTemplates, TemplateLookup};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// Map each input text to a task status, one `text -> status` line each
#[must_use]
pub fn render_statuses<S: AsRef<str>>(inputs: &[S]) -> String {
    let mut out = String::new();
    for input in inputs {
        let input = input.as_ref();
        let _ = writeln!(out, "{input:?} -> {}", map_status(input));
    }
    out
}

#[derive(Serialize)]
struct ProjectRow<'a> {
    id: &'a str,
    name: &'a str,
    progress: u8,
    status: ProjectStatus,
    sync: String,
    modules: usize,
    tasks: usize,
}

impl<'a> From<&'a Project> for ProjectRow<'a> {
    fn from(p: &'a Project) -> Self {
        Self {
            id: p.id.as_str(),
            name: &p.name,
            progress: p.progress,
            status: p.status,
            sync: p.sync.to_string(),
            modules: p.modules.len(),
            tasks: p.task_count(),
        }
    }
}

fn status_label(status: ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::NotStarted => "not started",
        ProjectStatus::InProgress => "in progress",
        ProjectStatus::Done => "done",
        ProjectStatus::Archived => "archived",
    }
}

/// Read the persisted state blob under `key` in `dir`
///
/// # Errors
/// If the blob is missing, unreadable or from a newer version.
pub async fn read_state(dir: &Path, key: &str) -> Result<PersistedState> {
    let store = FileStore::new(dir);
    let bytes = store
        .load(key)
        .await
        .with_context(|| format!("reading state from {}", dir.display()))?;
    let Some(bytes) = bytes else {
        bail!("no saved state under `{key}` in {}", dir.display());
    };
    PersistedState::from_bytes(&bytes).context("decoding saved state")
}

/// Render saved projects as a table or JSON
///
/// # Errors
/// If JSON encoding fails.
pub fn render_state(state: &PersistedState, json: bool) -> Result<String> {
    let rows: Vec<ProjectRow<'_>> = state.projects.iter().map(ProjectRow::from).collect();
    if json {
        return Ok(serde_json::to_string_pretty(&rows)?);
    }

    let mut out = String::new();
    match state.last_cache_update {
        Some(at) => writeln!(out, "cache updated {}", at.to_rfc3339())?,
        None => writeln!(out, "no cache snapshot")?,
    }
    writeln!(out, "theme: {}", state.theme)?;
    for row in &rows {
        writeln!(
            out,
            "{:<28} {:>3}%  {:<12} {:<8} {} modules, {} tasks  [{}]",
            row.name,
            row.progress,
            status_label(row.status),
            row.sync,
            row.modules,
            row.tasks,
            row.id
        )?;
    }
    if rows.is_empty() {
        writeln!(out, "no projects")?;
    }
    Ok(out)
}

/// Resolve `name` against a template file and render the template
///
/// # Errors
/// If the file cannot be read or parsed, or no template matches.
pub fn render_template(file: &Path, name: &str) -> Result<String> {
    let yaml = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let templates = StaticTemplates::from_yaml_str(&yaml)
        .with_context(|| format!("parsing {}", file.display()))?;
    let Some(template) = templates.find_by_name(name) else {
        let known: Vec<_> = templates.names().collect();
        bail!("no template named `{name}` (known: {})", known.join(", "));
    };

    let mut out = String::new();
    writeln!(out, "{} ({}, team {}, color {})", template.name, template.kind, template.team, template.color)?;
    for task in &template.tasks {
        writeln!(out, "  - {}", task.name)?;
        for subtask in &task.subtasks {
            writeln!(out, "      - {subtask}")?;
        }
    }
    Ok(out)
}
