// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation orchestrator.
//!
//! One `ConversationManager` per live conversation: it owns its memory
//! manager (and through it a session identity), so concurrent
//! conversations are isolated by partitioning rather than locking.
//!
//! Provider failures never escape `send_message` as errors; they become a
//! short apology string that is stored and returned like any other reply,
//! so the front ends have a single code path.

use std::sync::Arc;

use tracing::{debug, warn};

use yui_config::YuiConfig;
use yui_core::types::{ChatMessage, ProviderRequest, Role};
use yui_core::{ProviderAdapter, YuiError};
use yui_emotion::EmotionDetector;
use yui_memory::MemoryManager;
use yui_persona::{Personality, get_personality};
use yui_storage::models::UserStats;

/// How many relevant past-conversation snippets go into the prompt.
const MAX_CONTEXT_ITEMS: usize = 3;

/// Manages conversation flow and context for one user.
pub struct ConversationManager {
    provider: Arc<dyn ProviderAdapter>,
    persona: Personality,
    emotion: EmotionDetector,
    memory: MemoryManager,
    model: String,
    temperature: f32,
    max_tokens: u32,
    history_window: i64,
}

impl ConversationManager {
    /// Creates an orchestrator for `user_name` and starts its first session.
    ///
    /// Fails with [`YuiError::Persistence`] when the relational store
    /// cannot be opened, or [`YuiError::Config`] for an unknown startup
    /// personality. A missing vector index is not a failure.
    pub async fn new(
        config: &YuiConfig,
        provider: Arc<dyn ProviderAdapter>,
        user_name: &str,
    ) -> Result<Self, YuiError> {
        let persona = get_personality(&config.agent.default_personality).ok_or_else(|| {
            YuiError::Config(format!(
                "unknown personality `{}`",
                config.agent.default_personality
            ))
        })?;

        let memory = MemoryManager::open(config, user_name, None).await?;
        memory.start_session(persona.id).await?;

        Ok(Self {
            provider,
            persona,
            emotion: EmotionDetector::new(),
            memory,
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            history_window: config.agent.history_window as i64,
        })
    }

    pub fn persona(&self) -> &Personality {
        &self.persona
    }

    pub fn user_name(&self) -> &str {
        self.memory.user_name()
    }

    pub fn session_id(&self) -> &str {
        self.memory.session_id()
    }

    pub fn vector_enabled(&self) -> bool {
        self.memory.vector_enabled()
    }

    /// Processes one user turn and returns the assistant's reply.
    ///
    /// Emotion detection and memory retrieval feed the prompt; both turns
    /// are persisted. Only relational-store failures propagate.
    pub async fn send_message(&self, text: &str) -> Result<String, YuiError> {
        let emotion_label = self.emotion.analyze(text).map(|r| r.label());

        let context = self
            .memory
            .get_relevant_context(text, MAX_CONTEXT_ITEMS)
            .await?;

        self.memory
            .save_message(Role::User, text, self.persona.id, emotion_label.as_deref())
            .await?;

        let history = self.memory.get_recent_memory(self.history_window).await?;
        let messages: Vec<ChatMessage> = history
            .into_iter()
            .filter_map(|m| {
                m.role.parse::<Role>().ok().map(|role| ChatMessage {
                    role,
                    content: m.content,
                })
            })
            .collect();

        let mut system_prompt = self.persona.system_prompt(self.user_name());
        if !context.is_empty() {
            system_prompt.push_str("\n\n# Relevant past conversations\n");
            for snippet in &context {
                system_prompt.push_str(snippet);
                system_prompt.push('\n');
            }
        }

        let request = ProviderRequest {
            model: self.model.clone(),
            system_prompt: Some(system_prompt),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let reply = match self.provider.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "provider call failed, returning apology text");
                format!(
                    "Sorry, I couldn't reach my language model just now ({e}). \
                     Give me a moment and try again."
                )
            }
        };

        self.memory
            .save_message(Role::Assistant, &reply, self.persona.id, None)
            .await?;

        debug!(
            session_id = self.session_id(),
            emotion = emotion_label.as_deref().unwrap_or("none"),
            context_items = context.len(),
            "turn complete"
        );

        Ok(reply)
    }

    /// Switches to a different personality under a fresh session.
    ///
    /// The old session is ended, never reopened: switching always mints a
    /// new session id.
    pub async fn switch_personality(&mut self, name: &str) -> Result<&Personality, YuiError> {
        let persona = get_personality(name)
            .ok_or_else(|| YuiError::Config(format!("unknown personality `{name}`")))?;

        self.memory.end_session().await?;
        self.memory.clear_session_memory();
        self.memory.start_session(persona.id).await?;
        self.persona = persona;
        Ok(&self.persona)
    }

    /// Starts over under the current personality.
    ///
    /// History stays in the store; only the live session pivots.
    pub async fn clear_history(&mut self) -> Result<(), YuiError> {
        self.memory.end_session().await?;
        self.memory.clear_session_memory();
        self.memory.start_session(self.persona.id).await
    }

    /// Aggregate statistics for this user.
    pub async fn stats(&self) -> Result<UserStats, YuiError> {
        self.memory.get_user_stats().await
    }

    /// One-paragraph description of the live conversation.
    pub async fn summary(&self) -> Result<String, YuiError> {
        let history = self.memory.get_recent_memory(self.history_window).await?;
        Ok(format!(
            "Conversation with {personality}\nUser: {user}\nSession: {session}\nMessages in window: {count}",
            personality = self.persona.name,
            user = self.user_name(),
            session = self.session_id(),
            count = history.len(),
        ))
    }

    /// Ends the current session cleanly.
    pub async fn end(&self) -> Result<(), YuiError> {
        self.memory.end_session().await
    }
}
