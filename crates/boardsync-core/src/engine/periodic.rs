//! Timers: periodic background sync and the delayed reconcile refresh

use super::{EngineInner, SyncEngine};
use crate::inflight::OperationKey;
use std::sync::{Arc, Weak};
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

impl SyncEngine {
    /// Run a background refresh every `periodic_interval`
    ///
    /// The first refresh happens one period from now. Calling this again
    /// replaces the running timer. The timer stops when every engine handle
    /// is dropped.
    pub fn start_periodic_sync(&self) {
        let period = self.inner.config.periodic_interval;
        let weak = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(engine) = upgrade(&weak) else {
                    break;
                };
                tracing::debug!("periodic sync tick");
                engine.background_refresh().await;
            }
        });

        if let Some(previous) = self.inner.periodic.lock().replace(handle) {
            previous.abort();
            tracing::debug!("replaced periodic sync timer");
        }
        tracing::info!(period_secs = period.as_secs(), "periodic sync started");
    }

    /// Stop the periodic sync timer, if running
    pub fn stop_periodic_sync(&self) {
        if let Some(handle) = self.inner.periodic.lock().take() {
            handle.abort();
            tracing::info!("periodic sync stopped");
        }
    }

    /// Whether the periodic sync timer is running
    #[must_use]
    pub fn is_periodic_sync_running(&self) -> bool {
        self.inner
            .periodic
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Refresh once `reconcile_delay` from now, unless a reconcile is
    /// already scheduled
    pub(super) fn schedule_reconcile(&self) {
        let Some(guard) = self
            .inner
            .inflight
            .try_acquire(OperationKey::ScheduledReconcile)
        else {
            tracing::debug!("reconcile already scheduled");
            return;
        };
        let delay = self.inner.config.reconcile_delay;
        let weak = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            sleep(delay).await;
            drop(guard);
            if let Some(engine) = upgrade(&weak) {
                tracing::debug!("running scheduled reconcile");
                engine.background_refresh().await;
            }
        });
    }
}

fn upgrade(weak: &Weak<EngineInner>) -> Option<SyncEngine> {
    weak.upgrade().map(|inner| SyncEngine { inner })
}
