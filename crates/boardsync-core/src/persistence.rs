//! Persistence of engine state
//!
//! The engine saves one JSON blob ([`PersistedState`]) under a named key
//! through a [`PersistenceAdapter`]:
//! - [`MemoryStore`]: process-local, for tests and embedding
//! - [`FileStore`]: one `<key>.json` file per key, replaced atomically

use crate::error::PersistenceError;
use crate::store::Theme;
use boardsync_model::Project;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Version written by this build
pub const STATE_VERSION: u32 = 1;

/// Named blob storage
#[async_trait::async_trait]
pub trait PersistenceAdapter: Send + Sync + Debug {
    /// Blob stored under `key`, if any
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError>;

    /// Store `bytes` under `key`, replacing any previous blob
    async fn store(&self, key: &str, bytes: Vec<u8>) -> Result<(), PersistenceError>;

    /// Remove the blob under `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Persisted engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Blob format version; absent in blobs written before versioning
    #[serde(default)]
    pub version: u32,
    /// Visible projects
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Cached projects, if a snapshot existed
    #[serde(default)]
    pub cache_snapshot: Option<Vec<Project>>,
    /// Fetch time of the snapshot
    #[serde(default)]
    pub last_cache_update: Option<DateTime<Utc>>,
    /// UI theme preference
    #[serde(default)]
    pub theme: Theme,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            projects: Vec::new(),
            cache_snapshot: None,
            last_cache_update: None,
            theme: Theme::default(),
        }
    }
}

impl PersistedState {
    /// Encode as JSON
    ///
    /// # Errors
    /// `PersistenceError::Serialization` if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode and upgrade a blob to [`STATE_VERSION`]
    ///
    /// # Errors
    /// - `PersistenceError::Serialization` for malformed JSON
    /// - `PersistenceError::UnsupportedVersion` for blobs from a newer build
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistenceError> {
        let mut state: Self = serde_json::from_slice(bytes)?;
        if state.version > STATE_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: state.version,
                supported: STATE_VERSION,
            });
        }
        if state.version == 0 {
            tracing::debug!("upgrading unversioned state blob");
            state.version = STATE_VERSION;
        }
        Ok(state)
    }
}

/// In-memory blob storage
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a blob exists under `key`
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }
}

#[async_trait::async_trait]
impl PersistenceAdapter for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.blobs.get(key).map(|b| b.value().clone()))
    }

    async fn store(&self, key: &str, bytes: Vec<u8>) -> Result<(), PersistenceError> {
        self.blobs.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.blobs.remove(key);
        Ok(())
    }
}

/// Blob storage in a directory, one `<key>.json` file per key
///
/// Writes go to a temporary sibling file that is then renamed over the
/// target, so readers see either the old or the new blob.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    tmp_counter: AtomicU64,
}

impl FileStore {
    /// Store rooted at `dir` (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tmp_counter: AtomicU64::new(0),
        }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`
    ///
    /// # Errors
    /// `PersistenceError::Io` (invalid input) for keys that are empty or
    /// contain path separators.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(PersistenceError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid storage key `{key}`"),
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait::async_trait]
impl PersistenceAdapter for FileStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, key: &str, bytes: Vec<u8>) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = self.dir.join(format!(".{key}.{n}.tmp"));
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tracing::trace!(path = %path.display(), bytes = bytes.len(), "state written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardsync_model::SyncState;
    use pretty_assertions::assert_eq;

    fn sample_state() -> PersistedState {
        let mut project = Project::new("Acme-123", Utc::now());
        project.sync = SyncState::error("board creation failed");
        PersistedState {
            projects: vec![project.clone()],
            cache_snapshot: Some(vec![project]),
            last_cache_update: Some(Utc::now()),
            theme: Theme::Dark,
            ..PersistedState::default()
        }
    }

    #[test]
    fn blob_uses_camel_case_keys() {
        let bytes = sample_state().to_bytes().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["version"], 1);
        assert!(json.get("cacheSnapshot").is_some());
        assert!(json.get("lastCacheUpdate").is_some());
        assert_eq!(json["theme"], "dark");
    }

    #[test]
    fn unversioned_blob_is_upgraded() {
        let state = PersistedState::from_bytes(br#"{"projects": [], "theme": "light"}"#).unwrap();
        assert_eq!(state.version, STATE_VERSION);
        assert!(state.cache_snapshot.is_none());
    }

    #[test]
    fn newer_blob_is_rejected() {
        let err = PersistedState::from_bytes(br#"{"version": 7}"#).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::UnsupportedVersion {
                found: 7,
                supported: 1
            }
        ));
    }

    #[test]
    fn malformed_blob_is_rejected() {
        let err = PersistedState::from_bytes(b"not json").unwrap_err();
        assert!(matches!(err, PersistenceError::Serialization(_)));
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.load("k").await.unwrap(), None);

        store.store("k", b"abc".to_vec()).await.unwrap();
        assert!(store.contains("k"));
        assert_eq!(store.load("k").await.unwrap(), Some(b"abc".to_vec()));

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(!store.contains("k"));
    }

    #[tokio::test]
    async fn file_store_replaces_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state"));

        assert_eq!(store.load("boardsync-state").await.unwrap(), None);

        let state = sample_state();
        store
            .store("boardsync-state", state.to_bytes().unwrap())
            .await
            .unwrap();
        store
            .store("boardsync-state", state.to_bytes().unwrap())
            .await
            .unwrap();

        let bytes = store.load("boardsync-state").await.unwrap().unwrap();
        assert_eq!(PersistedState::from_bytes(&bytes).unwrap(), state);

        let entries: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["boardsync-state.json".to_string()]);
    }

    #[tokio::test]
    async fn file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.store("../escape", Vec::new()).await.is_err());
        assert!(store.path_for("").is_err());
    }
}
