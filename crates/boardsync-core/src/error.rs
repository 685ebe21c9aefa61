//! Error types for boardsync-core

use crate::config::ConfigError;
use boardsync_model::LocalId;
use boardsync_remote::{ParseError, TransportError};
use std::fmt;

/// Kind of entity a lookup failed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Project
    Project,
    /// Module
    Module,
    /// Task
    Task,
    /// Sub-task
    SubTask,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Project => "project",
            Self::Module => "module",
            Self::Task => "task",
            Self::SubTask => "sub-task",
        })
    }
}

/// Persistence failures
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Storage I/O failed
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Blob could not be encoded or decoded
    #[error("state blob is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Blob written by a newer version
    #[error("state blob version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the blob
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },
}

/// Synchronization engine errors
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Missing or inconsistent configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote call failed
    #[error("remote call failed: {0}")]
    Transport(#[from] TransportError),

    /// Remote payload failed validation
    #[error("invalid remote payload: {0}")]
    Parse(#[from] ParseError),

    /// Referenced entity does not exist
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind
        kind: EntityKind,
        /// Local id that was looked up
        id: LocalId,
    },

    /// Operation needs a remote board but the project has none
    #[error("project {id} has no remote board")]
    LocalOnly {
        /// Project local id
        id: LocalId,
    },

    /// Request rejected before any change
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// State could not be persisted or restored
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl SyncError {
    /// Not-found error
    #[inline]
    pub fn not_found(kind: EntityKind, id: &LocalId) -> Self {
        Self::NotFound {
            kind,
            id: id.clone(),
        }
    }

    /// Whether retrying the same operation may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_transient(),
            Self::Persistence(PersistenceError::Io(_)) => true,
            _ => false,
        }
    }

    /// Short message suitable for the global error slot
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.to_string(),
            Self::Transport(e) => format!("Could not reach the workspace: {}", e.message),
            Self::Parse(_) => "The workspace returned data that could not be read".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result alias for engine operations
pub type SyncResult<T> = Result<T, SyncError>;
