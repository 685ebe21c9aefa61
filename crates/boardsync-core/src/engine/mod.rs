//! Synchronization engine
//!
//! [`SyncEngine`] is the single owner of dashboard state. It is a cheap
//! handle (`Clone` shares the same engine), so background refreshes and
//! timers can run on spawned tasks.
//!
//! Every mutation follows the same two phases:
//! 1. Local apply: the change is installed immediately, derived fields are
//!    recomputed, and the project enters [`SyncState::Syncing`] if a remote
//!    call follows
//! 2. Remote confirm: the gateway call runs; the project settles to
//!    `Synced` or `Error { message }`. Local changes are never reverted.

mod archive;
mod cache;
mod create;
mod mutations;
mod periodic;

pub use cache::RefreshOutcome;

use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::inflight::InFlightRegistry;
use crate::persistence::{PersistedState, PersistenceAdapter};
use crate::reconcile::IdAssignments;
use crate::snapshot::{CachePolicy, CacheSnapshot};
use crate::store::{ProjectStore, Theme};
use boardsync_model::{LocalId, Project, SyncState, TemplateLookup};
use boardsync_remote::{RemoteGateway, TransportError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Message recorded on projects whose confirmation was cut short by a restart
pub const INTERRUPTED_MESSAGE: &str = "interrupted before remote confirmation";

/// Synchronization engine handle
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

pub(crate) struct EngineInner {
    config: SyncConfig,
    gateway: Arc<dyn RemoteGateway>,
    templates: Arc<dyn TemplateLookup>,
    clock: Arc<dyn Clock>,
    persistence: Option<Arc<dyn PersistenceAdapter>>,
    store: ProjectStore,
    inflight: InFlightRegistry,
    periodic: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        if let Some(handle) = self.periodic.get_mut().take() {
            handle.abort();
        }
    }
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.inner.config)
            .field("projects", &self.inner.store.projects().len())
            .field("in_flight", &self.inner.inflight.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`SyncEngine`]
pub struct SyncEngineBuilder {
    config: SyncConfig,
    gateway: Arc<dyn RemoteGateway>,
    templates: Arc<dyn TemplateLookup>,
    clock: Arc<dyn Clock>,
    persistence: Option<Arc<dyn PersistenceAdapter>>,
}

impl SyncEngineBuilder {
    /// With a clock (defaults to the system clock)
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// With a persistence adapter (defaults to none)
    #[must_use]
    pub fn with_persistence(mut self, adapter: Arc<dyn PersistenceAdapter>) -> Self {
        self.persistence = Some(adapter);
        self
    }

    /// Build the engine
    ///
    /// # Errors
    /// `SyncError::Config` if the timing windows are inconsistent.
    /// Missing credentials are not an error here; remote operations report
    /// them when they run.
    pub fn build(self) -> SyncResult<SyncEngine> {
        self.config.validate()?;
        Ok(SyncEngine {
            inner: Arc::new(EngineInner {
                config: self.config,
                gateway: self.gateway,
                templates: self.templates,
                clock: self.clock,
                persistence: self.persistence,
                store: ProjectStore::default(),
                inflight: InFlightRegistry::new(),
                periodic: Mutex::new(None),
            }),
        })
    }
}

impl SyncEngine {
    /// Start building an engine
    pub fn builder(
        config: SyncConfig,
        gateway: Arc<dyn RemoteGateway>,
        templates: Arc<dyn TemplateLookup>,
    ) -> SyncEngineBuilder {
        SyncEngineBuilder {
            config,
            gateway,
            templates,
            clock: Arc::new(SystemClock),
            persistence: None,
        }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Registry of running single-flight operations
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.inner.inflight
    }

    /// Visible projects
    #[must_use]
    pub fn projects(&self) -> Arc<Vec<Project>> {
        self.inner.store.projects()
    }

    /// One visible project
    #[must_use]
    pub fn project(&self, id: &LocalId) -> Option<Project> {
        self.inner.store.project(id)
    }

    /// Current cache snapshot
    #[must_use]
    pub fn snapshot(&self) -> Option<CacheSnapshot> {
        self.inner.store.snapshot()
    }

    /// Projects archived during this session
    #[must_use]
    pub fn archived_projects(&self) -> Vec<Project> {
        self.inner.store.archived()
    }

    /// Whether a blocking load is running
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.store.is_loading()
    }

    /// Last surfaced error message
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.inner.store.error()
    }

    /// Clear the global error
    pub fn clear_error(&self) {
        self.inner.store.set_error(None);
    }

    /// Theme preference
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.inner.store.theme()
    }

    /// Change the theme preference and persist it
    pub async fn set_theme(&self, theme: Theme) {
        self.inner.store.set_theme(theme);
        self.persist_quietly().await;
    }

    /// Write current state through the persistence adapter, if any
    ///
    /// # Errors
    /// `SyncError::Persistence` if encoding or storage fails.
    pub async fn persist(&self) -> SyncResult<()> {
        let Some(adapter) = &self.inner.persistence else {
            return Ok(());
        };
        let bytes = self.inner.store.to_persisted().to_bytes()?;
        adapter.store(&self.inner.config.storage_key, bytes).await?;
        Ok(())
    }

    /// Load state saved by a previous run
    ///
    /// Projects that were still waiting for remote confirmation are marked
    /// as failed, since that confirmation will never arrive. Returns whether
    /// a blob was found.
    ///
    /// # Errors
    /// `SyncError::Persistence` for unreadable or unsupported blobs.
    pub async fn restore(&self) -> SyncResult<bool> {
        let Some(adapter) = &self.inner.persistence else {
            return Ok(false);
        };
        let Some(bytes) = adapter.load(&self.inner.config.storage_key).await? else {
            tracing::debug!("no persisted state");
            return Ok(false);
        };
        let mut state = PersistedState::from_bytes(&bytes)?;
        let interrupted = mark_interrupted(&mut state.projects)
            + state
                .cache_snapshot
                .as_mut()
                .map_or(0, |projects| mark_interrupted(projects));
        tracing::info!(
            projects = state.projects.len(),
            interrupted,
            "restored persisted state"
        );
        self.inner.store.restore(state);
        Ok(true)
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    fn policy(&self) -> CachePolicy {
        CachePolicy::from(&self.inner.config)
    }

    async fn persist_quietly(&self) {
        if let Err(e) = self.persist().await {
            tracing::warn!(error = %e, "failed to persist state");
        }
    }

    /// Record `err` as the global error and hand it back
    fn surface(&self, err: SyncError) -> SyncError {
        tracing::error!(error = %err, "operation failed");
        self.inner.store.set_error(Some(err.user_message()));
        err
    }

    /// Local phase of a mutation
    ///
    /// `f` returns its value and whether a remote call follows; if one does,
    /// the project enters `Syncing` in the same write.
    fn apply_local<R>(
        &self,
        project: &LocalId,
        f: impl FnOnce(&mut Project) -> SyncResult<(R, bool)>,
    ) -> SyncResult<R> {
        self.inner.store.update_project(project, self.now(), |p| {
            let (value, remote) = f(p)?;
            if remote {
                p.sync = SyncState::Syncing;
            }
            Ok(value)
        })
    }

    /// Remote phase of a mutation: attach confirmed ids and settle the sync
    /// state in one write
    fn settle(
        &self,
        project: &LocalId,
        ids: &IdAssignments,
        outcome: Result<(), TransportError>,
        operation: &str,
    ) {
        let state = match outcome {
            Ok(()) => SyncState::Synced,
            Err(e) => {
                tracing::warn!(
                    project = %project,
                    error = %e,
                    "{operation} failed remotely; local change kept"
                );
                SyncState::error(e.to_string())
            }
        };
        let applied = self.inner.store.update_project(project, self.now(), |p| {
            ids.apply(p);
            p.sync = state;
            Ok(())
        });
        if applied.is_err() {
            tracing::debug!(project = %project, "{operation} settled after project was removed");
        }
    }
}

fn mark_interrupted(projects: &mut [Project]) -> usize {
    let mut count = 0;
    for project in projects.iter_mut().filter(|p| p.sync.is_syncing()) {
        project.sync = SyncState::error(INTERRUPTED_MESSAGE);
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::persistence::MemoryStore;
    use boardsync_model::StaticTemplates;
    use boardsync_test_utils::FakeGateway;
    use std::time::Duration;

    pub(super) fn engine_with(gateway: Arc<FakeGateway>) -> SyncEngine {
        SyncEngine::builder(
            SyncConfig::new().with_credentials("ws-1", "token"),
            gateway,
            Arc::new(boardsync_test_utils::sample_templates()),
        )
        .with_clock(Arc::new(ManualClock::default()))
        .build()
        .unwrap()
    }

    #[test]
    fn inconsistent_windows_are_rejected() {
        let config = SyncConfig::new()
            .with_freshness_window(Duration::from_secs(1))
            .with_staleness_threshold(Duration::from_secs(5));
        let result = SyncEngine::builder(
            config,
            Arc::new(FakeGateway::new()),
            Arc::new(StaticTemplates::default()),
        )
        .build();
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn clones_share_state() {
        let engine = engine_with(Arc::new(FakeGateway::new()));
        let clone = engine.clone();
        engine.inner.store.set_error(Some("boom".into()));
        assert_eq!(clone.error().as_deref(), Some("boom"));
        clone.clear_error();
        assert!(engine.error().is_none());
    }

    #[tokio::test]
    async fn restore_marks_pending_projects_failed() {
        let store = Arc::new(MemoryStore::new());
        let mut pending = Project::new("Acme", Utc::now());
        pending.sync = SyncState::Syncing;
        let blob = PersistedState {
            projects: vec![pending],
            ..PersistedState::default()
        };
        store
            .store("boardsync-state", blob.to_bytes().unwrap())
            .await
            .unwrap();

        let engine = SyncEngine::builder(
            SyncConfig::new(),
            Arc::new(FakeGateway::new()),
            Arc::new(StaticTemplates::default()),
        )
        .with_persistence(store)
        .build()
        .unwrap();

        assert!(engine.restore().await.unwrap());
        let projects = engine.projects();
        assert_eq!(
            projects[0].sync.error_message(),
            Some(INTERRUPTED_MESSAGE)
        );
        assert!(engine.snapshot().is_none());
    }

    #[tokio::test]
    async fn theme_is_persisted() {
        let store = Arc::new(MemoryStore::new());
        let engine = SyncEngine::builder(
            SyncConfig::new(),
            Arc::new(FakeGateway::new()),
            Arc::new(StaticTemplates::default()),
        )
        .with_persistence(store.clone())
        .build()
        .unwrap();

        engine.set_theme(Theme::Dark).await;

        let bytes = store.load("boardsync-state").await.unwrap().unwrap();
        assert_eq!(PersistedState::from_bytes(&bytes).unwrap().theme, Theme::Dark);
    }

    #[tokio::test]
    async fn restore_without_adapter_is_a_no_op() {
        let engine = engine_with(Arc::new(FakeGateway::new()));
        assert!(!engine.restore().await.unwrap());
        engine.persist().await.unwrap();
    }
}
