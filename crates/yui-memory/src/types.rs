// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types for the semantic memory system.

use serde::{Deserialize, Serialize};

/// A denormalized copy of one user utterance, stored for semantic retrieval.
///
/// Fragments are write-once and eventually consistent with the relational
/// store: the two are written in the same logical operation but not in the
/// same transaction, so a fragment may be missing for a message that exists
/// relationally. Only user-authored content is ever fragmented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryFragment {
    /// Unique id derived from the session and the write instant.
    pub id: String,
    /// Namespace owner. Queries never cross this boundary.
    pub user_name: String,
    pub session_id: String,
    pub personality: String,
    pub content: String,
    /// L2-normalized embedding vector.
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub emotion: Option<String>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

/// One retrieval hit, from either the vector index or the keyword fallback.
#[derive(Debug, Clone)]
pub struct RetrievedMemory {
    pub content: String,
    pub session_id: String,
    pub personality: String,
    pub timestamp: String,
    pub emotion: Option<String>,
    /// Cosine similarity when the hit came from the vector index;
    /// `None` for keyword-fallback hits, which are ordered by recency.
    pub score: Option<f32>,
}

/// Convert an f32 vector to bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a SQLite BLOB back to an f32 vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}

/// Compute cosine similarity between two vectors.
///
/// For L2-normalized vectors (the embedder's output) this is the dot
/// product.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
