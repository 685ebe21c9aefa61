//! Cache snapshot and freshness classification

use crate::config::SyncConfig;
use boardsync_model::Project;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// How a snapshot may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Freshness {
    /// Serve as-is
    Fresh,
    /// Serve, and refresh in the background
    Stale,
    /// Do not serve; fetch with a blocking load
    Expired,
}

/// Age thresholds used to classify a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Snapshots up to this age are served
    pub freshness_window: Duration,
    /// Snapshots beyond this age trigger a background refresh
    pub staleness_threshold: Duration,
}

impl CachePolicy {
    /// Classify a snapshot of the given age
    #[must_use]
    pub fn classify(&self, age: Duration) -> Freshness {
        if age <= self.staleness_threshold {
            Freshness::Fresh
        } else if age <= self.freshness_window {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}

impl From<&SyncConfig> for CachePolicy {
    fn from(config: &SyncConfig) -> Self {
        Self {
            freshness_window: config.freshness_window,
            staleness_threshold: config.staleness_threshold,
        }
    }
}

/// Copy of the project collection with the time it was fetched
///
/// Never mutated in place: updates build a new snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSnapshot {
    projects: Arc<Vec<Project>>,
    taken_at: DateTime<Utc>,
}

impl CacheSnapshot {
    /// Snapshot of `projects` taken at `taken_at`
    #[must_use]
    pub fn new(projects: Arc<Vec<Project>>, taken_at: DateTime<Utc>) -> Self {
        Self { projects, taken_at }
    }

    /// Cached projects
    #[inline]
    #[must_use]
    pub fn projects(&self) -> Arc<Vec<Project>> {
        Arc::clone(&self.projects)
    }

    /// Fetch time
    #[inline]
    #[must_use]
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Age at `now`; a fetch time in the future counts as age zero
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.taken_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Freshness at `now` under `policy`
    #[must_use]
    pub fn freshness(&self, now: DateTime<Utc>, policy: &CachePolicy) -> Freshness {
        policy.classify(self.age(now))
    }

    /// Same fetch time, different projects
    ///
    /// Used when a local mutation must be reflected in the cache without
    /// pretending the remote side was re-read.
    #[must_use]
    pub fn with_projects(&self, projects: Arc<Vec<Project>>) -> Self {
        Self {
            projects,
            taken_at: self.taken_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn policy() -> CachePolicy {
        CachePolicy::from(&SyncConfig::default())
    }

    #[test]
    fn classification_boundaries() {
        let p = policy();
        assert_eq!(p.classify(Duration::ZERO), Freshness::Fresh);
        assert_eq!(p.classify(Duration::from_secs(120)), Freshness::Fresh);
        assert_eq!(p.classify(Duration::from_secs(121)), Freshness::Stale);
        assert_eq!(p.classify(Duration::from_secs(600)), Freshness::Stale);
        assert_eq!(p.classify(Duration::from_secs(601)), Freshness::Expired);
    }

    #[test]
    fn age_from_clock() {
        let taken = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let snapshot = CacheSnapshot::new(Arc::new(Vec::new()), taken);

        let later = taken + chrono::Duration::minutes(3);
        assert_eq!(snapshot.age(later), Duration::from_secs(180));
        assert_eq!(snapshot.freshness(later, &policy()), Freshness::Stale);

        let earlier = taken - chrono::Duration::minutes(1);
        assert_eq!(snapshot.age(earlier), Duration::ZERO);
    }

    #[test]
    fn with_projects_keeps_fetch_time() {
        let taken = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let snapshot = CacheSnapshot::new(Arc::new(Vec::new()), taken);
        let replaced = snapshot.with_projects(Arc::new(vec![Project::new("p", taken)]));

        assert_eq!(replaced.taken_at(), taken);
        assert_eq!(replaced.projects().len(), 1);
        assert!(snapshot.projects().is_empty());
    }
}
