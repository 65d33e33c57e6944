#![allow(dead_code)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```ignore
//! mod common;
//! use common::*;
//! ```

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Installs a fmt subscriber once per test binary so `tracing` output
/// from the library lands in the captured test output. The filter honors
/// `RUST_LOG`, defaulting to `trace` for the crate under test.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tvbuf=trace"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
