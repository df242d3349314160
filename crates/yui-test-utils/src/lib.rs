// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities shared across Yui integration tests.

pub mod mock_provider;

pub use mock_provider::{FailingProvider, MockProvider};

use yui_config::YuiConfig;

/// A config pointing at a throwaway on-disk database, with the vector
/// index disabled so tests never touch the network or model files.
///
/// Returns the tempdir so callers keep it alive for the test's duration.
pub fn test_config() -> (YuiConfig, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = YuiConfig::default();
    config.storage.database_path = dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .into_owned();
    config.memory.enabled = false;
    (config, dir)
}
