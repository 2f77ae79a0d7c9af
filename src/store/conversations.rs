// ABOUTME: In-memory conversation store with per-conversation mutation locks
// ABOUTME: Holds active guided-analysis conversations for the process lifetime
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Conversation storage.
//!
//! Conversations are ephemeral: created by "start", mutated by each "chat"
//! turn, read by "complete", and never deleted except through the age-based
//! eviction helper (which is not scheduled anywhere; an external caller such
//! as the admin maintenance endpoint must invoke it).
//!
//! Turn-taking on one conversation must be sequential. The store hands out a
//! per-conversation async mutex; the conversation manager holds it across
//! its read-modify-write section so two concurrent requests against the same
//! conversation cannot interleave and drop messages or miscount questions.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::llm::ChatMessage;

/// State of one guided-analysis conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    /// Unique identifier, generated at creation
    pub id: Uuid,
    /// Subject student id
    pub student_id: String,
    /// Denormalized student display name
    pub student_name: String,
    /// Ordered message history, append-only while the conversation is active
    pub messages: Vec<ChatMessage>,
    /// Incremented once per assistant turn; drives completion
    pub question_count: u32,
    /// Set once `question_count` reaches the completion threshold
    pub is_complete: bool,
    /// Creation timestamp, used for staleness eviction
    pub created_at: DateTime<Utc>,
}

impl ConversationState {
    /// Create a fresh conversation for a student
    #[must_use]
    pub fn new(student_id: String, student_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            student_name,
            messages: Vec::new(),
            question_count: 0,
            is_complete: false,
            created_at: Utc::now(),
        }
    }

    /// Most recent assistant message content, if any
    #[must_use]
    pub fn last_assistant_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::llm::MessageRole::Assistant)
            .map(|m| m.content.as_str())
    }
}

/// In-memory map from conversation id to [`ConversationState`]
#[derive(Default)]
pub struct ConversationStore {
    conversations: DashMap<Uuid, ConversationState>,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ConversationStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a conversation by id, returning an owned copy
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<ConversationState> {
        self.conversations.get(&id).map(|entry| entry.clone())
    }

    /// Insert or replace a conversation
    pub fn insert(&self, conversation: ConversationState) {
        self.conversations.insert(conversation.id, conversation);
    }

    /// Remove a conversation and its lock entry
    pub fn remove(&self, id: Uuid) -> bool {
        self.locks.remove(&id);
        self.conversations.remove(&id).is_some()
    }

    /// Obtain the mutation lock for a conversation id.
    ///
    /// Callers hold the guard across their read-modify-write section. Locks
    /// are created lazily and cleaned up on [`Self::remove`] and eviction.
    #[must_use]
    pub fn mutation_lock(&self, id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Number of live conversations
    #[must_use]
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Evict conversations older than `max_age`, returning how many were
    /// removed. Never scheduled; invoked by an external caller.
    pub fn clear_older_than(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let stale: Vec<Uuid> = self
            .conversations
            .iter()
            .filter(|entry| entry.created_at < cutoff)
            .map(|entry| entry.id)
            .collect();

        for id in &stale {
            self.conversations.remove(id);
            self.locks.remove(id);
        }
        stale.len()
    }
}
