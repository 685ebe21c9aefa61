//! In-memory engine state
//!
//! One [`RwLock`] guards the whole state. Every write builds a complete new
//! project collection and swaps it in, so readers only ever see a full
//! pre- or post-mutation collection. The lock is never held across an
//! await point.
//!
//! Each project write bumps a revision counter. A fetch records the revision
//! it started at; when its result is installed, projects written since then
//! keep their local version.

use crate::error::{EntityKind, SyncError};
use crate::persistence::PersistedState;
use crate::reconcile::{carry_over, reconcile_with};
use crate::snapshot::CacheSnapshot;
use boardsync_model::{LocalId, Project, ProjectStatus, RemoteId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// UI theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Light
    #[default]
    Light,
    /// Dark
    Dark,
    /// Follow the system setting
    System,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        })
    }
}

#[derive(Debug, Default)]
struct State {
    projects: Arc<Vec<Project>>,
    snapshot: Option<CacheSnapshot>,
    archived: Vec<Project>,
    loading: bool,
    error: Option<String>,
    theme: Theme,
    revision: u64,
    written: HashMap<LocalId, u64>,
}

impl State {
    /// Swap in a new collection, mirroring it into the snapshot if one exists
    fn replace_projects(&mut self, projects: Vec<Project>) -> Arc<Vec<Project>> {
        let projects = Arc::new(projects);
        if let Some(snapshot) = &self.snapshot {
            self.snapshot = Some(snapshot.with_projects(Arc::clone(&projects)));
        }
        self.projects = Arc::clone(&projects);
        projects
    }

    fn mark_written(&mut self, id: &LocalId) {
        self.revision += 1;
        self.written.insert(id.clone(), self.revision);
    }

    fn written_since(&self, id: &LocalId, revision: u64) -> bool {
        self.written.get(id).is_some_and(|&r| r > revision)
    }
}

/// Engine state container
#[derive(Debug, Default)]
pub(crate) struct ProjectStore {
    state: RwLock<State>,
}

impl ProjectStore {
    pub(crate) fn projects(&self) -> Arc<Vec<Project>> {
        Arc::clone(&self.state.read().projects)
    }

    pub(crate) fn project(&self, id: &LocalId) -> Option<Project> {
        self.state.read().projects.iter().find(|p| &p.id == id).cloned()
    }

    pub(crate) fn snapshot(&self) -> Option<CacheSnapshot> {
        self.state.read().snapshot.clone()
    }

    /// Serve the snapshot as the visible collection
    pub(crate) fn adopt_snapshot(&self, snapshot: &CacheSnapshot) -> Arc<Vec<Project>> {
        let mut state = self.state.write();
        let projects = snapshot.projects();
        if !Arc::ptr_eq(&state.projects, &projects) {
            state.projects = Arc::clone(&projects);
        }
        projects
    }

    /// Current write revision; record it before fetching
    pub(crate) fn revision(&self) -> u64 {
        self.state.read().revision
    }

    /// Reconcile projects fetched from `revision` on into state and take a
    /// new snapshot
    ///
    /// Projects written after `revision` keep their local version, and
    /// boards archived after it are not brought back.
    pub(crate) fn install_fresh(
        &self,
        fresh: Vec<Project>,
        revision: u64,
        taken_at: DateTime<Utc>,
    ) -> Arc<Vec<Project>> {
        let mut state = self.state.write();
        let archived: HashSet<&RemoteId> = state
            .archived
            .iter()
            .filter(|p| state.written_since(&p.id, revision))
            .filter_map(|p| p.remote_id.as_ref())
            .collect();
        let fresh: Vec<Project> = fresh
            .into_iter()
            .filter(|p| p.remote_id.as_ref().map_or(true, |r| !archived.contains(r)))
            .collect();
        let merged = Arc::new(reconcile_with(&state.projects, fresh, |p| {
            state.written_since(&p.id, revision)
        }));
        state.projects = Arc::clone(&merged);
        state.snapshot = Some(CacheSnapshot::new(Arc::clone(&merged), taken_at));
        merged
    }

    /// Replace one project with its fresh remote version
    ///
    /// A project with a pending remote confirmation, or one written after
    /// `revision`, is left as it is.
    pub(crate) fn install_project(
        &self,
        id: &LocalId,
        fresh: Project,
        revision: u64,
    ) -> Result<Project, SyncError> {
        let mut state = self.state.write();
        let index = state
            .projects
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| SyncError::not_found(EntityKind::Project, id))?;
        if state.projects[index].sync.is_syncing() || state.written_since(id, revision) {
            return Ok(state.projects[index].clone());
        }
        let merged = carry_over(&state.projects[index], fresh);
        let mut projects = (*state.projects).clone();
        projects[index] = merged.clone();
        state.replace_projects(projects);
        Ok(merged)
    }

    /// Apply `f` to a copy of the collection; installed only if `f` succeeds
    pub(crate) fn update<R>(
        &self,
        f: impl FnOnce(&mut Vec<Project>) -> Result<R, SyncError>,
    ) -> Result<R, SyncError> {
        let mut state = self.state.write();
        let mut projects = (*state.projects).clone();
        let result = f(&mut projects)?;
        state.replace_projects(projects);
        Ok(result)
    }

    /// Apply `f` to one project; derived fields are recomputed afterwards
    pub(crate) fn update_project<R>(
        &self,
        id: &LocalId,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut Project) -> Result<R, SyncError>,
    ) -> Result<R, SyncError> {
        let mut state = self.state.write();
        let mut projects = (*state.projects).clone();
        let project = projects
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| SyncError::not_found(EntityKind::Project, id))?;
        let result = f(project)?;
        project.recompute();
        project.updated_at = now;
        state.replace_projects(projects);
        state.mark_written(id);
        Ok(result)
    }

    /// Move a project to the archived set
    pub(crate) fn archive(&self, id: &LocalId, now: DateTime<Utc>) -> Result<Project, SyncError> {
        let mut state = self.state.write();
        let mut projects = (*state.projects).clone();
        let index = projects
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| SyncError::not_found(EntityKind::Project, id))?;
        let mut project = projects.remove(index);
        project.status = ProjectStatus::Archived;
        project.updated_at = now;
        state.archived.push(project.clone());
        state.replace_projects(projects);
        state.mark_written(id);
        Ok(project)
    }

    pub(crate) fn archived(&self) -> Vec<Project> {
        self.state.read().archived.clone()
    }

    pub(crate) fn invalidate(&self) {
        self.state.write().snapshot = None;
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        self.state.write().loading = loading;
    }

    pub(crate) fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    pub(crate) fn set_error(&self, error: Option<String>) {
        self.state.write().error = error;
    }

    pub(crate) fn theme(&self) -> Theme {
        self.state.read().theme
    }

    pub(crate) fn set_theme(&self, theme: Theme) {
        self.state.write().theme = theme;
    }

    pub(crate) fn to_persisted(&self) -> PersistedState {
        let state = self.state.read();
        PersistedState {
            projects: state.projects.as_ref().clone(),
            cache_snapshot: state.snapshot.as_ref().map(|s| s.projects().as_ref().clone()),
            last_cache_update: state.snapshot.as_ref().map(CacheSnapshot::taken_at),
            theme: state.theme,
            ..PersistedState::default()
        }
    }

    pub(crate) fn restore(&self, persisted: PersistedState) {
        let mut state = self.state.write();
        state.projects = Arc::new(persisted.projects);
        state.snapshot = match (persisted.cache_snapshot, persisted.last_cache_update) {
            (Some(projects), Some(taken_at)) => {
                Some(CacheSnapshot::new(Arc::new(projects), taken_at))
            }
            _ => None,
        };
        state.theme = persisted.theme;
    }
}
