// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation orchestration: binds the LLM provider, personality,
//! emotion detection, and the memory system into a turn loop.

pub mod conversation;

pub use conversation::ConversationManager;
