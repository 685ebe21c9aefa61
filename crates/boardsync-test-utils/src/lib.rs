//! Testing utilities for boardsync workspace
//!
//! Shared fakes, fixtures, and tracing setup.

#![allow(missing_docs)]

pub mod fixtures;
pub mod gateway;

pub use fixtures::{sample_templates, sample_workspace, BoardBuilder};
pub use gateway::{FakeGateway, GatewayOp};

use tracing_subscriber::EnvFilter;

/// Install a test-friendly tracing subscriber (honours `RUST_LOG`)
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
