// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios over a real on-disk database: the orchestrator,
//! memory manager, and relational store wired together with a mock
//! provider.

use std::sync::Arc;

use yui_agent::ConversationManager;
use yui_memory::MemoryManager;
use yui_storage::Database;
use yui_storage::queries::profiles;
use yui_test_utils::{MockProvider, test_config};

#[tokio::test]
async fn full_conversation_lifecycle() {
    let (config, _dir) = test_config();
    let provider = Arc::new(MockProvider::with_responses(vec![
        "That's great!".to_string(),
        "Pizza it is, then.".to_string(),
    ]));

    let mut manager = ConversationManager::new(&config, provider.clone(), "Alice")
        .await
        .unwrap();

    // Turn 1: the emotion label rides along with the user message.
    let reply = manager.send_message("I love pizza").await.unwrap();
    assert_eq!(reply, "That's great!");

    // Turn 2: keyword recall of turn 1 lands in the system prompt.
    let reply = manager.send_message("pizza").await.unwrap();
    assert_eq!(reply, "Pizza it is, then.");

    let request = provider.last_request().await.unwrap();
    let system = request.system_prompt.unwrap();
    assert!(system.contains("# Relevant past conversations"));
    assert!(system.contains("]: I love pizza"));

    // Personality switch mints a new session; favorite still follows counts.
    manager.switch_personality("friday").await.unwrap();
    manager.send_message("status?").await.unwrap();

    let stats = manager.stats().await.unwrap();
    assert_eq!(stats.total_messages, 6);
    assert_eq!(stats.total_sessions, 2);

    manager.end().await.unwrap();
}

#[tokio::test]
async fn history_survives_reopening_the_store() {
    let (config, _dir) = test_config();

    {
        let manager = ConversationManager::new(
            &config,
            Arc::new(MockProvider::new()),
            "Alice",
        )
        .await
        .unwrap();
        manager.send_message("remember the blue door").await.unwrap();
        manager.end().await.unwrap();
    }

    // A fresh memory manager over the same file sees the old rows.
    let memory = MemoryManager::open(&config, "Alice", None).await.unwrap();
    let history = memory.get_full_history(50).await.unwrap();
    assert_eq!(history.len(), 2);

    let hits = memory.search_semantic_memory("blue door", 5).await.unwrap();
    assert!(!hits.is_empty());
    assert!(hits[0].content.contains("blue door"));
}

#[tokio::test]
async fn sessions_with_three_personalities_report_favorite() {
    let (config, _dir) = test_config();
    let mut manager =
        ConversationManager::new(&config, Arc::new(MockProvider::new()), "Alice")
            .await
            .unwrap();

    // Sessions: yui (initial), yui, friday.
    manager.clear_history().await.unwrap();
    manager.switch_personality("friday").await.unwrap();

    let stats = manager.stats().await.unwrap();
    assert_eq!(stats.total_sessions, 3);
    assert_eq!(stats.favorite_personality.as_deref(), Some("yui"));
}

#[tokio::test]
async fn profile_is_shared_across_instances() {
    let (config, _dir) = test_config();

    let first = MemoryManager::open(&config, "Alice", None).await.unwrap();
    let created = first.get_user_profile().await.unwrap().created_at;

    let second = MemoryManager::open(&config, "Alice", None).await.unwrap();
    let profile = second.get_user_profile().await.unwrap();
    assert_eq!(profile.created_at, created);

    // Exactly one profile row exists.
    let db = Database::open(&config.storage.database_path).await.unwrap();
    let stats = profiles::user_stats(&db, "Alice").await.unwrap();
    assert_eq!(stats.total_messages, 0);
}

#[tokio::test]
async fn concurrent_sessions_for_one_user_stay_isolated() {
    let (config, _dir) = test_config();

    let a = ConversationManager::new(&config, Arc::new(MockProvider::new()), "Alice")
        .await
        .unwrap();
    let b = ConversationManager::new(&config, Arc::new(MockProvider::new()), "Alice")
        .await
        .unwrap();
    assert_ne!(a.session_id(), b.session_id());

    a.send_message("first thread").await.unwrap();
    b.send_message("second thread").await.unwrap();
    a.send_message("more in the first").await.unwrap();

    let stats = a.stats().await.unwrap();
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.total_messages, 6);

    let summary_a = a.summary().await.unwrap();
    assert!(summary_a.contains("Messages in window: 4"));
}
