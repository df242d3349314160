// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Yui companion agent.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Yui workspace. LLM provider and
//! embedding adapters implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::YuiError;
pub use types::{AdapterType, HealthStatus, Role};

pub use traits::{EmbeddingAdapter, PluginAdapter, ProviderAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_exist() {
        let _config = YuiError::Config("test".into());
        let _persistence = YuiError::Persistence {
            source: Box::new(std::io::Error::other("test")),
        };
        let _semantic = YuiError::SemanticIndex {
            message: "test".into(),
            source: None,
        };
        let _provider = YuiError::Provider {
            message: "test".into(),
            source: None,
        };
        let _timeout = YuiError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = YuiError::Internal("test".into());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that the adapter traits are reachable
        // through the public API.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
    }
}
