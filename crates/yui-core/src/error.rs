// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Yui companion agent.

use thiserror::Error;

/// The primary error type used across all Yui crates.
///
/// The two memory-facing variants carry different contracts:
/// [`YuiError::Persistence`] is fatal to the memory manager and propagates
/// to the caller, while [`YuiError::SemanticIndex`] is always recovered at
/// the memory manager boundary and never reaches the conversation layer.
#[derive(Debug, Error)]
pub enum YuiError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The relational store is unreachable or corrupt.
    #[error("persistence error: {source}")]
    Persistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Embedding or vector index failure. Recovered by keyword fallback
    /// on the read path and dropped with a warning on the write path.
    #[error("semantic index error: {message}")]
    SemanticIndex {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM provider errors (API failure, unusable response, unknown backend).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl YuiError {
    /// Wraps an arbitrary error as a persistence failure.
    pub fn persistence<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        YuiError::Persistence {
            source: Box::new(source),
        }
    }

    /// Builds a semantic-index failure from a message only.
    pub fn semantic(message: impl Into<String>) -> Self {
        YuiError::SemanticIndex {
            message: message.into(),
            source: None,
        }
    }
}
