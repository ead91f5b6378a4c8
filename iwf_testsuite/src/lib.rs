//! Testing utilities for iWF workflows and clients.
//!
//! This crate provides a recording [`MockWorkflowService`] that stands in for
//! the iWF server, sample workflow definitions, and a tracing setup helper,
//! so client and worker code can be tested without a running server.

pub mod fixtures;
pub mod mock;

pub use mock::*;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a `tracing` subscriber honouring `RUST_LOG`; safe to call from
/// every test
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
