// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic memory system for the Yui companion agent.
//!
//! Combines durable conversation history (via `yui-storage`) with a
//! best-effort per-user vector index for retrieval by meaning. When the
//! embedding backend cannot be initialized, or fails at runtime, retrieval
//! degrades to keyword search -- never to an error the conversation layer
//! has to handle.
//!
//! ## Architecture
//!
//! - **OnnxEmbedder**: local 384-dim embedding inference
//! - **ModelManager**: first-run model download from HuggingFace
//! - **FragmentStore**: per-user namespaced fragments with BLOB vectors
//! - **SemanticIndex**: embed + cosine retrieval over one namespace
//! - **MemoryManager**: the session-bound orchestrator and only write path

pub mod embedder;
pub mod fragments;
pub mod manager;
pub mod model_manager;
pub mod types;

pub use embedder::OnnxEmbedder;
pub use fragments::FragmentStore;
pub use manager::{MemoryManager, SemanticIndex};
pub use model_manager::ModelManager;
pub use types::*;
