//! Cache lifecycle: load, background refresh, invalidation, per-project
//! refresh

use super::SyncEngine;
use crate::error::{EntityKind, SyncError, SyncResult};
use crate::inflight::{InFlightGuard, OperationKey};
use crate::snapshot::Freshness;
use crate::transform::{project_from_board, projects_from_boards};
use boardsync_model::{LocalId, Project, RemoteId};
use boardsync_remote::{parse_board, parse_boards};
use std::sync::Arc;

/// Result of a background refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Projects and snapshot were replaced
    Refreshed,
    /// Another refresh was already running; nothing was done
    AlreadyRunning,
    /// The refresh failed; visible state is unchanged
    Failed,
}

impl SyncEngine {
    /// Projects, from cache when allowed
    ///
    /// With `use_cache`, a fresh snapshot is returned as-is and a stale one
    /// is returned while a background refresh is started. Otherwise (no
    /// snapshot, expired snapshot, or `use_cache == false`) projects are
    /// fetched with a blocking load.
    ///
    /// # Errors
    /// Configuration, transport and parse errors of the blocking load; they
    /// are also recorded as the global error.
    pub async fn load(&self, use_cache: bool) -> SyncResult<Arc<Vec<Project>>> {
        if use_cache {
            if let Some(snapshot) = self.inner.store.snapshot() {
                let age = snapshot.age(self.now());
                match self.policy().classify(age) {
                    Freshness::Fresh => {
                        tracing::debug!(age_secs = age.as_secs(), "serving fresh snapshot");
                        return Ok(self.inner.store.adopt_snapshot(&snapshot));
                    }
                    Freshness::Stale => {
                        tracing::debug!(age_secs = age.as_secs(), "serving stale snapshot");
                        self.spawn_background_refresh();
                        return Ok(self.inner.store.adopt_snapshot(&snapshot));
                    }
                    Freshness::Expired => {
                        tracing::debug!(age_secs = age.as_secs(), "snapshot expired");
                    }
                }
            }
        }
        self.blocking_load().await
    }

    /// Drop the snapshot; the next load fetches
    pub fn invalidate(&self) {
        tracing::debug!("cache invalidated");
        self.inner.store.invalidate();
    }

    /// Invalidate and reload
    ///
    /// # Errors
    /// As [`load`](Self::load).
    pub async fn force_sync(&self) -> SyncResult<Arc<Vec<Project>>> {
        self.invalidate();
        self.load(false).await
    }

    /// Refresh the whole collection unless a refresh is already running
    ///
    /// Failures are logged only; visible state and the global error are
    /// left alone. Projects changed locally while the listing was in flight
    /// keep their local version.
    pub async fn background_refresh(&self) -> RefreshOutcome {
        match self.inner.inflight.try_acquire(OperationKey::BackgroundRefresh) {
            Some(guard) => self.run_background_refresh(guard).await,
            None => {
                tracing::debug!("background refresh already running");
                RefreshOutcome::AlreadyRunning
            }
        }
    }

    /// Start a background refresh on a new task; returns whether one started
    pub(super) fn spawn_background_refresh(&self) -> bool {
        let Some(guard) = self.inner.inflight.try_acquire(OperationKey::BackgroundRefresh) else {
            tracing::debug!("background refresh already running");
            return false;
        };
        let engine = self.clone();
        tokio::spawn(async move {
            engine.run_background_refresh(guard).await;
        });
        true
    }

    async fn run_background_refresh(&self, guard: InFlightGuard) -> RefreshOutcome {
        let revision = self.inner.store.revision();
        let outcome = match self.fetch_projects().await {
            Ok(fresh) => {
                let installed = self.inner.store.install_fresh(fresh, revision, self.now());
                tracing::info!(projects = installed.len(), "background refresh complete");
                RefreshOutcome::Refreshed
            }
            Err(e) => {
                tracing::warn!(error = %e, "background refresh failed");
                RefreshOutcome::Failed
            }
        };
        drop(guard);
        if outcome == RefreshOutcome::Refreshed {
            self.persist_quietly().await;
        }
        outcome
    }

    /// Refetch one project's board and replace the project with it
    ///
    /// A project with a pending confirmation, or one changed locally while
    /// the board was being fetched, is returned unchanged, as is one whose
    /// refresh is already running.
    ///
    /// # Errors
    /// - `NotFound` for an unknown id, `LocalOnly` for a project with no board
    /// - Configuration, transport and parse errors, also recorded as the
    ///   global error
    pub async fn refresh_project(&self, id: &LocalId) -> SyncResult<Project> {
        let project = self
            .project(id)
            .ok_or_else(|| SyncError::not_found(EntityKind::Project, id))?;
        let board = project
            .remote_id
            .clone()
            .ok_or_else(|| SyncError::LocalOnly { id: id.clone() })?;

        let Some(_guard) = self
            .inner
            .inflight
            .try_acquire(OperationKey::ProjectRefresh(id.clone()))
        else {
            tracing::debug!(project = %id, "project refresh already running");
            return Ok(project);
        };

        let revision = self.inner.store.revision();
        let fresh = self
            .fetch_project(&board)
            .await
            .map_err(|e| self.surface(e))?;
        let installed = self.inner.store.install_project(id, fresh, revision)?;
        tracing::info!(project = %id, board = %board, "project refreshed");
        self.persist_quietly().await;
        Ok(installed)
    }

    async fn blocking_load(&self) -> SyncResult<Arc<Vec<Project>>> {
        self.inner.store.set_loading(true);
        let revision = self.inner.store.revision();
        let result = self.fetch_projects().await;
        self.inner.store.set_loading(false);

        match result {
            Ok(fresh) => {
                let installed = self.inner.store.install_fresh(fresh, revision, self.now());
                self.inner.store.set_error(None);
                tracing::info!(projects = installed.len(), "projects loaded");
                self.persist_quietly().await;
                Ok(installed)
            }
            Err(e) => Err(self.surface(e)),
        }
    }

    async fn fetch_projects(&self) -> SyncResult<Vec<Project>> {
        self.inner.config.require_credentials()?;
        let raw = self.inner.gateway.list_boards().await?;
        let boards = parse_boards(&raw)?;
        Ok(projects_from_boards(
            &boards,
            self.inner.templates.as_ref(),
            self.now(),
        ))
    }

    async fn fetch_project(&self, board: &RemoteId) -> SyncResult<Project> {
        self.inner.config.require_credentials()?;
        let raw = self.inner.gateway.get_board(board).await?;
        let record = parse_board(&raw)?;
        Ok(project_from_board(
            &record,
            self.inner.templates.as_ref(),
            self.now(),
        ))
    }
}
