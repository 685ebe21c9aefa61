//! In-flight registry
//!
//! Single-flight guard per operation key: the first caller acquires the key
//! and holds it until its [`InFlightGuard`] drops; later callers get `None`
//! and skip. Distinct keys never block each other.

use boardsync_model::LocalId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

/// Operation identity for deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationKey {
    /// Whole-collection background refresh
    BackgroundRefresh,
    /// Refresh of one project
    ProjectRefresh(LocalId),
    /// Delayed refresh after structural module changes
    ScheduledReconcile,
}

/// Registry of operations currently running
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    running: Arc<DashMap<OperationKey, Instant>>,
}

impl InFlightRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or `None` if it is already running
    #[must_use]
    pub fn try_acquire(&self, key: OperationKey) -> Option<InFlightGuard> {
        match self.running.entry(key.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                Some(InFlightGuard {
                    running: Arc::clone(&self.running),
                    key,
                })
            }
        }
    }

    /// Whether `key` is currently held
    #[must_use]
    pub fn is_in_flight(&self, key: &OperationKey) -> bool {
        self.running.contains_key(key)
    }

    /// Number of held keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.running.len()
    }

    /// Whether nothing is running
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }
}

/// Releases its key on drop
#[derive(Debug)]
pub struct InFlightGuard {
    running: Arc<DashMap<OperationKey, Instant>>,
    key: OperationKey,
}

impl InFlightGuard {
    /// The held key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &OperationKey {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.running.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_until_release() {
        let registry = InFlightRegistry::new();
        let guard = registry.try_acquire(OperationKey::BackgroundRefresh);
        assert!(guard.is_some());
        assert!(registry
            .try_acquire(OperationKey::BackgroundRefresh)
            .is_none());
        assert!(registry.is_in_flight(&OperationKey::BackgroundRefresh));

        drop(guard);
        assert!(registry.is_empty());
        assert!(registry
            .try_acquire(OperationKey::BackgroundRefresh)
            .is_some());
    }

    #[test]
    fn distinct_keys_are_independent() {
        let registry = InFlightRegistry::new();
        let _a = registry
            .try_acquire(OperationKey::ProjectRefresh(LocalId::from("a")))
            .unwrap();
        let _b = registry
            .try_acquire(OperationKey::ProjectRefresh(LocalId::from("b")))
            .unwrap();
        let _c = registry
            .try_acquire(OperationKey::BackgroundRefresh)
            .unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn clones_share_state() {
        let registry = InFlightRegistry::new();
        let clone = registry.clone();
        let _guard = registry
            .try_acquire(OperationKey::ScheduledReconcile)
            .unwrap();
        assert!(clone.try_acquire(OperationKey::ScheduledReconcile).is_none());
    }
}
