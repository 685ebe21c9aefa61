#![allow(dead_code)]

use boardsync_core::{ManualClock, SyncConfig, SyncEngine};
use boardsync_remote::RawBoard;
use boardsync_test_utils::{init_tracing, sample_templates, FakeGateway};
use chrono::{TimeZone, Utc};
use std::sync::Arc;

pub fn config() -> SyncConfig {
    SyncConfig::new().with_credentials("ws-1", "test-token")
}

pub struct Harness {
    pub engine: SyncEngine,
    pub gateway: Arc<FakeGateway>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(boards: Vec<RawBoard>) -> Self {
        Self::with_config(boards, config())
    }

    pub fn with_config(boards: Vec<RawBoard>, config: SyncConfig) -> Self {
        init_tracing();
        let gateway = Arc::new(FakeGateway::with_boards(boards));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
        ));
        let engine = SyncEngine::builder(config, gateway.clone(), Arc::new(sample_templates()))
            .with_clock(clock.clone())
            .build()
            .unwrap();
        Self {
            engine,
            gateway,
            clock,
        }
    }
}

/// Yield to spawned tasks until `cond` holds
pub async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..10_000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
