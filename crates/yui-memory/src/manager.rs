// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The memory manager: the single read/write path for conversational memory.
//!
//! Binds a session identity to a user for its lifetime, fans writes out to
//! the relational store and the vector index, and answers relevance
//! queries with graceful fallback to keyword search.
//!
//! Whether the vector index is available is decided exactly once, at
//! construction, and carried as `Option<SemanticIndex>`. Call sites branch
//! on that option -- never on caught failures -- so the degraded mode is
//! an ordinary code path, not an exception handler.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use yui_config::YuiConfig;
use yui_core::YuiError;
use yui_core::traits::embedding::EmbeddingAdapter;
use yui_core::types::{EmbeddingInput, Role};
use yui_storage::models::{MessageRecord, UserProfile, UserStats};
use yui_storage::queries::{messages, profiles, sessions};
use yui_storage::Database;

use crate::embedder::OnnxEmbedder;
use crate::fragments::FragmentStore;
use crate::model_manager::ModelManager;
use crate::types::{MemoryFragment, RetrievedMemory, cosine_similarity};

/// The vector side of the memory system: embedder + fragment namespace.
///
/// Best-effort by contract. Every error it returns is a
/// [`YuiError::SemanticIndex`] and is recovered by the owning
/// [`MemoryManager`].
pub struct SemanticIndex {
    store: FragmentStore,
    embedder: Arc<dyn EmbeddingAdapter>,
    similarity_threshold: f32,
    max_results: usize,
}

impl SemanticIndex {
    /// Builds an index from parts. This is the injection seam: tests and
    /// alternative embedding backends come in through here.
    pub fn new(
        store: FragmentStore,
        embedder: Arc<dyn EmbeddingAdapter>,
        similarity_threshold: f32,
        max_results: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            similarity_threshold,
            max_results,
        }
    }

    /// Config-driven initialization with the local ONNX embedder.
    ///
    /// Resolves model files (downloading on first run when allowed), loads
    /// the ONNX session, and opens a dedicated connection to the fragment
    /// table. Any failure here means "vector disabled", decided by the
    /// caller.
    pub async fn initialize(config: &YuiConfig) -> Result<Self, YuiError> {
        let db_path = PathBuf::from(&config.storage.database_path);
        let data_dir = db_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let model_manager = ModelManager::new(
            data_dir,
            config.memory.model_name.clone(),
            Duration::from_secs(config.memory.download_timeout_secs),
        );

        let model_dir = if config.memory.auto_download {
            model_manager.ensure_model().await?
        } else if model_manager.is_model_available() {
            model_manager.model_dir()
        } else {
            return Err(YuiError::semantic(format!(
                "embedding model files missing under {} and auto_download is off",
                model_manager.model_dir().display()
            )));
        };

        let embedder = Arc::new(OnnxEmbedder::new(&model_dir)?);
        let store = FragmentStore::open(&config.storage.database_path).await?;

        Ok(Self::new(
            store,
            embedder,
            config.memory.similarity_threshold,
            config.memory.max_results,
        ))
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, YuiError> {
        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await?;
        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| YuiError::semantic("embedder returned no vectors"))
    }

    /// Embed and store one fragment in its user's namespace.
    pub async fn index(&self, mut fragment: MemoryFragment) -> Result<(), YuiError> {
        fragment.embedding = self.embed_one(&fragment.content).await?;
        self.store.insert(&fragment).await
    }

    /// Top-`k` fragments for `text`, similarity-descending.
    ///
    /// An empty namespace yields an empty vec, never an error.
    pub async fn query(
        &self,
        user_name: &str,
        text: &str,
        k: usize,
    ) -> Result<Vec<RetrievedMemory>, YuiError> {
        let query_vec = self.embed_one(text).await?;
        let candidates = self.store.embeddings_for(user_name).await?;

        let mut ranked: Vec<(String, f32)> = candidates
            .into_iter()
            .filter_map(|(id, embedding)| {
                if embedding.len() != query_vec.len() {
                    return None;
                }
                let similarity = cosine_similarity(&query_vec, &embedding);
                (similarity >= self.similarity_threshold).then_some((id, similarity))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(k.min(self.max_results));

        if ranked.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = ranked.iter().map(|(id, _)| id.clone()).collect();
        let fragments = self.store.fragments_by_ids(user_name, &ids).await?;
        let by_id: HashMap<&str, &MemoryFragment> =
            fragments.iter().map(|f| (f.id.as_str(), f)).collect();

        // Re-impose similarity order: the batch fetch returns rows in
        // storage order.
        let hits = ranked
            .iter()
            .filter_map(|(id, score)| {
                by_id.get(id.as_str()).map(|f| RetrievedMemory {
                    content: f.content.clone(),
                    session_id: f.session_id.clone(),
                    personality: f.personality.clone(),
                    timestamp: f.created_at.clone(),
                    emotion: f.emotion.clone(),
                    score: Some(*score),
                })
            })
            .collect();
        Ok(hits)
    }
}

/// Central memory system combining durable conversation history, the
/// per-user semantic index, and user profiles.
///
/// One instance per conversation; concurrent conversations get their own
/// instances and session identifiers (isolation by partitioning). The
/// session id changes only through [`MemoryManager::clear_session_memory`].
pub struct MemoryManager {
    user_name: String,
    session_id: String,
    db: Database,
    semantic: Option<SemanticIndex>,
}

impl MemoryManager {
    /// Opens the memory system for a user.
    ///
    /// 1. Opens the relational store -- mandatory; a failure here is a
    ///    [`YuiError::Persistence`] and propagates.
    /// 2. Attempts to initialize the vector index; on any failure the
    ///    manager continues with semantic search disabled.
    /// 3. Resolves or creates the user's profile.
    ///
    /// A fresh session id is minted unless one is supplied.
    pub async fn open(
        config: &YuiConfig,
        user_name: &str,
        session_id: Option<String>,
    ) -> Result<Self, YuiError> {
        let db = Database::open(&config.storage.database_path).await?;

        let semantic = if config.memory.enabled {
            match SemanticIndex::initialize(config).await {
                Ok(index) => Some(index),
                Err(e) => {
                    warn!(error = %e, "vector memory disabled, falling back to keyword search");
                    None
                }
            }
        } else {
            info!("vector memory disabled by configuration");
            None
        };

        let manager = Self::from_parts(db, semantic, user_name, session_id);
        profiles::get_or_create_profile(&manager.db, &manager.user_name).await?;
        Ok(manager)
    }

    /// Assembles a manager from pre-built parts. Profile resolution is the
    /// caller's responsibility on this path.
    pub fn from_parts(
        db: Database,
        semantic: Option<SemanticIndex>,
        user_name: &str,
        session_id: Option<String>,
    ) -> Self {
        Self {
            user_name: user_name.to_string(),
            session_id: session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            db,
            semantic,
        }
    }

    /// The session id this manager currently writes under.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Whether semantic retrieval is active for this instance.
    pub fn vector_enabled(&self) -> bool {
        self.semantic.is_some()
    }

    /// Registers the current session in the relational store. Idempotent.
    pub async fn start_session(&self, personality: &str) -> Result<(), YuiError> {
        sessions::create_session(&self.db, &self.session_id, &self.user_name, personality).await
    }

    /// Saves one turn.
    ///
    /// The relational write always happens and its errors propagate. When
    /// the vector index is enabled and the turn is user-authored, the
    /// content is additionally indexed as a fragment; a failure there is
    /// logged and swallowed -- the relational write has already committed
    /// and is never rolled back.
    pub async fn save_message(
        &self,
        role: Role,
        content: &str,
        personality: &str,
        emotion: Option<&str>,
    ) -> Result<(), YuiError> {
        messages::insert_message(
            &self.db,
            &self.session_id,
            &self.user_name,
            personality,
            role,
            content,
            emotion,
        )
        .await?;

        if role == Role::User
            && let Some(index) = &self.semantic
        {
            let now = chrono::Utc::now();
            let fragment = MemoryFragment {
                id: format!(
                    "{}-{}",
                    self.session_id,
                    now.timestamp_nanos_opt().unwrap_or_default()
                ),
                user_name: self.user_name.clone(),
                session_id: self.session_id.clone(),
                personality: personality.to_string(),
                content: content.to_string(),
                embedding: Vec::new(),
                emotion: emotion.map(|e| e.to_string()),
                created_at: now.to_rfc3339(),
            };
            if let Err(e) = index.index(fragment).await {
                warn!(error = %e, "failed to index memory fragment");
            }
        }

        Ok(())
    }

    /// Recent history of the current session, oldest first.
    pub async fn get_recent_memory(&self, limit: i64) -> Result<Vec<MessageRecord>, YuiError> {
        messages::session_history(&self.db, &self.session_id, limit).await
    }

    /// Full cross-session history for this user, newest first.
    pub async fn get_full_history(&self, limit: i64) -> Result<Vec<MessageRecord>, YuiError> {
        messages::user_history(&self.db, &self.user_name, limit).await
    }

    /// Searches past conversations by meaning, with keyword fallback.
    ///
    /// With the vector index enabled, results are similarity-descending;
    /// any runtime failure degrades to keyword search instead of
    /// propagating. With it disabled, keyword search runs directly and
    /// results are recency-descending. Callers must not assume a stable
    /// cross-mode ordering.
    pub async fn search_semantic_memory(
        &self,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<RetrievedMemory>, YuiError> {
        if let Some(index) = &self.semantic {
            match index.query(&self.user_name, query, n_results).await {
                Ok(hits) => {
                    debug!(hits = hits.len(), "semantic search complete");
                    return Ok(hits);
                }
                Err(e) => {
                    warn!(error = %e, "semantic search failed, falling back to keyword search");
                }
            }
        }
        self.keyword_search(query, n_results).await
    }

    async fn keyword_search(
        &self,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<RetrievedMemory>, YuiError> {
        let rows =
            messages::search_conversations(&self.db, &self.user_name, query, n_results as i64)
                .await?;
        Ok(rows
            .into_iter()
            .map(|m| RetrievedMemory {
                content: m.content,
                session_id: m.session_id,
                personality: m.personality,
                timestamp: m.timestamp,
                emotion: m.emotion,
                score: None,
            })
            .collect())
    }

    /// Relevant past conversation snippets for a new message, formatted
    /// for prompt assembly. Empty when nothing relevant is found.
    pub async fn get_relevant_context(
        &self,
        current_message: &str,
        max_items: usize,
    ) -> Result<Vec<String>, YuiError> {
        let memories = self
            .search_semantic_memory(current_message, max_items)
            .await?;
        Ok(memories
            .into_iter()
            .map(|m| format!("[Past conversation from {}]: {}", m.timestamp, m.content))
            .collect())
    }

    /// Aggregate statistics for this user.
    pub async fn get_user_stats(&self) -> Result<UserStats, YuiError> {
        profiles::user_stats(&self.db, &self.user_name).await
    }

    /// Resolves or creates this user's profile, updating last-seen.
    pub async fn get_user_profile(&self) -> Result<UserProfile, YuiError> {
        profiles::get_or_create_profile(&self.db, &self.user_name).await
    }

    /// Overwrites this user's preferences. Last write wins.
    pub async fn update_preferences(&self, prefs: &serde_json::Value) -> Result<(), YuiError> {
        profiles::update_preferences(&self.db, &self.user_name, prefs).await
    }

    /// Marks the current session ended in the relational store.
    pub async fn end_session(&self) -> Result<(), YuiError> {
        sessions::end_session(&self.db, &self.session_id).await
    }

    /// Pivots to a fresh session id without deleting anything.
    ///
    /// No store write happens here: the new id reaches the relational
    /// store on the next `start_session` or `save_message`, so a gap
    /// between clearing and the next session never writes under a
    /// dangling id.
    pub fn clear_session_memory(&mut self) {
        self.session_id = uuid::Uuid::new_v4().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use yui_core::traits::adapter::PluginAdapter;
    use yui_core::types::{AdapterType, EmbeddingOutput, HealthStatus};

    use crate::fragments::store_in_memory;

    /// Deterministic embedder: three orthogonal topic axes.
    struct StubEmbedder;

    fn topic_vector(text: &str) -> Vec<f32> {
        let t = text.to_lowercase();
        if t.contains("pizza") || t.contains("food") {
            vec![1.0, 0.0, 0.0]
        } else if t.contains("rain") || t.contains("weather") {
            vec![0.0, 1.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        }
    }

    #[async_trait]
    impl PluginAdapter for StubEmbedder {
        fn name(&self) -> &str {
            "stub-embedder"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Embedding
        }
        async fn health_check(&self) -> Result<HealthStatus, YuiError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), YuiError> {
            Ok(())
        }
    }

    #[async_trait]
    impl EmbeddingAdapter for StubEmbedder {
        async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, YuiError> {
            Ok(EmbeddingOutput {
                embeddings: input.texts.iter().map(|t| topic_vector(t)).collect(),
                dimensions: 3,
            })
        }
    }

    /// Embedder that fails every call, for degradation tests.
    struct FailingEmbedder;

    #[async_trait]
    impl PluginAdapter for FailingEmbedder {
        fn name(&self) -> &str {
            "failing-embedder"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Embedding
        }
        async fn health_check(&self) -> Result<HealthStatus, YuiError> {
            Ok(HealthStatus::Unhealthy("always fails".into()))
        }
        async fn shutdown(&self) -> Result<(), YuiError> {
            Ok(())
        }
    }

    #[async_trait]
    impl EmbeddingAdapter for FailingEmbedder {
        async fn embed(&self, _input: EmbeddingInput) -> Result<EmbeddingOutput, YuiError> {
            Err(YuiError::semantic("embedding backend is down"))
        }
    }

    async fn manager_with(embedder: Option<Arc<dyn EmbeddingAdapter>>) -> MemoryManager {
        let db = Database::open_in_memory().await.unwrap();
        let semantic = match embedder {
            Some(embedder) => Some(SemanticIndex::new(
                store_in_memory().await,
                embedder,
                0.35,
                5,
            )),
            None => None,
        };
        let manager = MemoryManager::from_parts(db, semantic, "alice", None);
        profiles::get_or_create_profile(&manager.db, "alice")
            .await
            .unwrap();
        manager.start_session("yui").await.unwrap();
        manager
    }

    #[tokio::test]
    async fn save_and_recall_two_turns_in_order() {
        let manager = manager_with(None).await;
        manager
            .save_message(Role::User, "I love pizza", "yui", None)
            .await
            .unwrap();
        manager
            .save_message(Role::Assistant, "That's great!", "yui", None)
            .await
            .unwrap();

        let history = manager.get_recent_memory(50).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[0].content, "I love pizza");
        assert_eq!(history[0].emotion, None);
        assert_eq!(history[1].role, "assistant");
        assert_eq!(history[1].content, "That's great!");
        assert_eq!(history[1].emotion, None);
    }

    #[tokio::test]
    async fn keyword_fallback_when_vector_disabled() {
        let manager = manager_with(None).await;
        assert!(!manager.vector_enabled());

        manager
            .save_message(Role::User, "I love pizza", "yui", None)
            .await
            .unwrap();
        manager
            .save_message(Role::Assistant, "That's great!", "yui", None)
            .await
            .unwrap();

        let hits = manager.search_semantic_memory("pizza", 5).await.unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].content, "I love pizza");
        assert!(hits[0].score.is_none());
    }

    #[tokio::test]
    async fn semantic_search_ranks_by_similarity() {
        let manager = manager_with(Some(Arc::new(StubEmbedder))).await;
        assert!(manager.vector_enabled());

        manager
            .save_message(Role::User, "I love pizza night", "yui", Some("joy"))
            .await
            .unwrap();
        manager
            .save_message(Role::User, "the rain is heavy today", "yui", None)
            .await
            .unwrap();

        let hits = manager
            .search_semantic_memory("what food do I like?", 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1, "off-topic fragment is below threshold");
        assert_eq!(hits[0].content, "I love pizza night");
        assert_eq!(hits[0].emotion.as_deref(), Some("joy"));
        assert!(hits[0].score.unwrap() > 0.9);
    }

    #[tokio::test]
    async fn assistant_turns_are_never_indexed() {
        let manager = manager_with(Some(Arc::new(StubEmbedder))).await;
        manager
            .save_message(Role::User, "I love pizza", "yui", None)
            .await
            .unwrap();
        manager
            .save_message(Role::Assistant, "pizza is a fine choice", "yui", None)
            .await
            .unwrap();

        let index = manager.semantic.as_ref().unwrap();
        assert_eq!(index.store.count_for("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failing_index_degrades_to_keyword_search() {
        let manager = manager_with(Some(Arc::new(FailingEmbedder))).await;
        assert!(manager.vector_enabled());

        // The write path swallows the index failure; the relational row
        // must exist regardless.
        manager
            .save_message(Role::User, "I love pizza", "yui", None)
            .await
            .unwrap();
        assert_eq!(manager.get_recent_memory(50).await.unwrap().len(), 1);

        // The read path falls back to keyword search instead of raising.
        let hits = manager.search_semantic_memory("pizza", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "I love pizza");
        assert!(hits[0].score.is_none());
    }

    #[tokio::test]
    async fn relevant_context_is_formatted_with_timestamp() {
        let manager = manager_with(None).await;
        manager
            .save_message(Role::User, "I love pizza", "yui", None)
            .await
            .unwrap();

        let context = manager.get_relevant_context("pizza", 3).await.unwrap();
        assert_eq!(context.len(), 1);
        assert!(context[0].starts_with("[Past conversation from "));
        assert!(context[0].ends_with("]: I love pizza"));
    }

    #[tokio::test]
    async fn relevant_context_empty_when_nothing_matches() {
        let manager = manager_with(None).await;
        let context = manager.get_relevant_context("anything", 3).await.unwrap();
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn clear_mints_new_session_without_touching_store() {
        let mut manager = manager_with(None).await;
        let old_id = manager.session_id().to_string();

        manager.clear_session_memory();
        let new_id = manager.session_id().to_string();
        assert_ne!(old_id, new_id);

        // The new id is unknown to the store until the next start_session.
        let session = sessions::get_session(&manager.db, &new_id).await.unwrap();
        assert!(session.is_none());

        manager.start_session("yui").await.unwrap();
        let session = sessions::get_session(&manager.db, &new_id).await.unwrap();
        assert!(session.is_some());
    }

    #[tokio::test]
    async fn end_session_marks_only_current_session() {
        let manager = manager_with(None).await;
        manager.end_session().await.unwrap();

        let session = sessions::get_session(&manager.db, manager.session_id())
            .await
            .unwrap()
            .unwrap();
        assert!(session.ended_at.is_some());
    }

    #[tokio::test]
    async fn stats_reflect_sessions_across_personalities() {
        let mut manager = manager_with(None).await;
        // Session 1 already started under "yui".
        manager.clear_session_memory();
        manager.start_session("yui").await.unwrap();
        manager.clear_session_memory();
        manager.start_session("friday").await.unwrap();

        let stats = manager.get_user_stats().await.unwrap();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.favorite_personality.as_deref(), Some("yui"));
    }

    #[tokio::test]
    async fn profile_created_at_is_stable() {
        let manager = manager_with(None).await;
        let first = manager.get_user_profile().await.unwrap();
        let second = manager.get_user_profile().await.unwrap();
        assert_eq!(first.created_at, second.created_at);
        assert!(second.last_seen >= first.last_seen);
    }
}
