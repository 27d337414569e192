//! Test utilities for the training sheets service
//!
//! An in-memory spreadsheet session standing in for the remote backend, and
//! an HTTP harness running requests through the production router.

use crate::config::{CONFIG, TrainingSheetsConfig};
use anyhow::Result;
use std::sync::{Arc, Mutex};

pub mod fixtures;
pub mod http;
pub mod sheets;

/// Install the rustls provider the binary installs at startup. The OAuth
/// clients need a process-wide default when several providers are linked.
pub fn install_crypto_provider() {
    // Err only means another test already installed it
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

// Test configuration initialization
static TEST_CONFIG_INIT: Mutex<()> = Mutex::new(());

/// Test-only function to ensure configuration is loaded exactly once per test run
/// Available for both unit tests and integration tests
pub fn load_configuration_for_tests() -> Result<()> {
    let _guard = TEST_CONFIG_INIT
        .lock()
        .map_err(|e| anyhow::anyhow!("Test configuration lock poisoned: {}", e))?;

    // If config is already loaded, return success
    if CONFIG.get().is_some() {
        return Ok(());
    }

    // Load default configuration for tests
    let config = TrainingSheetsConfig::load()?;
    CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}
