//! boardsync synchronization core
//!
//! Keeps a local, cached mirror of a remote work-management workspace and
//! applies user edits optimistically:
//! - [`SyncEngine`]: state owner; load/refresh, mutations, archival, timers
//! - [`CacheSnapshot`] / [`Freshness`]: time-based cache classification
//! - [`InFlightRegistry`]: single-flight deduplication per operation key
//! - [`reconcile`]: carries local ids over fresh remote data
//! - [`PersistenceAdapter`]: saves and restores engine state
//!
//! # Example
//! ```no_run
//! use boardsync_core::{NewProject, SyncConfig, SyncEngine};
//! use boardsync_model::StaticTemplates;
//! # async fn demo(gateway: std::sync::Arc<dyn boardsync_remote::RemoteGateway>) -> Result<(), boardsync_core::SyncError> {
//! let engine = SyncEngine::builder(
//!     SyncConfig::from_env(),
//!     gateway,
//!     std::sync::Arc::new(StaticTemplates::default()),
//! )
//! .build()?;
//!
//! engine.load(true).await?;
//! let project = engine
//!     .create_project(NewProject::new("Acme-123").with_modules(["Infrastructure"]))
//!     .await?;
//! println!("{} is {}", project.name, project.sync);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod inflight;
pub mod persistence;
pub mod reconcile;
#[allow(missing_docs)]
pub mod requests;
pub mod snapshot;
pub mod store;
pub mod transform;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ApiToken, ConfigError, Credentials, SyncConfig};
pub use engine::{RefreshOutcome, SyncEngine, SyncEngineBuilder, INTERRUPTED_MESSAGE};
pub use error::{EntityKind, PersistenceError, SyncError, SyncResult};
pub use inflight::{InFlightGuard, InFlightRegistry, OperationKey};
pub use persistence::{FileStore, MemoryStore, PersistedState, PersistenceAdapter, STATE_VERSION};
pub use reconcile::{carry_over, reconcile, reconcile_with, IdAssignments};
pub use requests::{
    ModuleChanges, NewModule, NewProject, NewSubTask, NewTask, SubTaskChanges, TaskChanges,
};
pub use snapshot::{CachePolicy, CacheSnapshot, Freshness};
pub use store::Theme;
pub use transform::{project_from_board, projects_from_boards};
