// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded per-thread conversation memory.
//!
//! [`ConversationMemory`] keeps the recent turns of each Slack thread so
//! follow-up mentions can be answered with context. Two bounds apply:
//!
//! - each thread keeps at most `2 × max_turns_per_thread_context` turns, the
//!   most recent ones;
//! - at most `max_stored_thread_contexts` threads are kept, evicting the least
//!   recently updated thread first.
//!
//! Recency is tracked by a revision counter bumped on every update and stored
//! with each thread, so the order survives restarts and wall-clock changes.
//!
//! The memory is owned by the executor task and has no internal locking.

pub mod prompt;

use std::collections::HashMap;

use chrono::Utc;
use tether_config::model::MemoryConfig;
use tether_core::{ConversationTurn, ThreadConversation, ThreadKey};
use tracing::debug;

pub use prompt::build_augmented_prompt;

/// Result of [`ConversationMemory::record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    /// The thread after appending and trimming.
    pub conversation: ThreadConversation,
    /// Threads removed to respect the thread cap.
    pub evicted: Vec<ThreadKey>,
}

#[derive(Debug, Clone)]
pub struct ConversationMemory {
    threads: HashMap<ThreadKey, ThreadConversation>,
    max_turns_per_thread_context: usize,
    max_stored_thread_contexts: usize,
    revision: u64,
}

impl ConversationMemory {
    pub fn new(max_turns_per_thread_context: usize, max_stored_thread_contexts: usize) -> Self {
        Self {
            threads: HashMap::new(),
            max_turns_per_thread_context: max_turns_per_thread_context.max(1),
            max_stored_thread_contexts: max_stored_thread_contexts.max(1),
            revision: 0,
        }
    }

    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::new(
            config.max_turns_per_thread_context,
            config.max_stored_thread_contexts,
        )
    }

    /// Turns kept per thread.
    pub fn turn_capacity(&self) -> usize {
        self.max_turns_per_thread_context * 2
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn get(&self, key: &ThreadKey) -> Option<&ThreadConversation> {
        self.threads.get(key)
    }

    /// Prompt for `latest_prompt`, prefixed with the thread's recent turns.
    ///
    /// Returns `latest_prompt` unchanged when the thread has no history.
    /// Does not modify the memory.
    pub fn augment(&self, key: &ThreadKey, latest_prompt: &str) -> String {
        let turns = self
            .threads
            .get(key)
            .map(|c| c.turns.as_slice())
            .unwrap_or_default();
        let start = turns.len().saturating_sub(self.max_turns_per_thread_context);
        build_augmented_prompt(&turns[start..], latest_prompt)
    }

    /// Append turns to a thread, then enforce both bounds.
    pub fn record(
        &mut self,
        key: &ThreadKey,
        turns: impl IntoIterator<Item = ConversationTurn>,
    ) -> RecordOutcome {
        self.revision += 1;
        let revision = self.revision;
        let capacity = self.turn_capacity();

        let conversation = self
            .threads
            .entry(key.clone())
            .or_insert_with(|| ThreadConversation {
                key: key.clone(),
                turns: Vec::new(),
                updated_at: Utc::now(),
                revision,
            });
        conversation.turns.extend(turns);
        if conversation.turns.len() > capacity {
            let excess = conversation.turns.len() - capacity;
            conversation.turns.drain(..excess);
        }
        conversation.updated_at = Utc::now();
        conversation.revision = revision;
        let conversation = conversation.clone();

        let evicted = self.evict_overflow();
        RecordOutcome {
            conversation,
            evicted,
        }
    }

    /// Replace the contents with previously persisted threads.
    ///
    /// Bounds are re-applied, so a smaller configured cap takes effect on load.
    /// Returns the threads dropped by the thread cap.
    pub fn restore(
        &mut self,
        conversations: impl IntoIterator<Item = ThreadConversation>,
    ) -> Vec<ThreadKey> {
        self.threads.clear();
        let capacity = self.turn_capacity();
        for mut conversation in conversations {
            if conversation.turns.len() > capacity {
                let excess = conversation.turns.len() - capacity;
                conversation.turns.drain(..excess);
            }
            self.threads.insert(conversation.key.clone(), conversation);
        }
        self.revision = self.threads.values().map(|c| c.revision).max().unwrap_or(0);
        self.evict_overflow()
    }

    /// All threads, least recently updated first.
    pub fn snapshot(&self) -> Vec<ThreadConversation> {
        let mut all: Vec<ThreadConversation> = self.threads.values().cloned().collect();
        all.sort_by_key(|c| c.revision);
        all
    }

    /// Forget every thread.
    pub fn clear(&mut self) {
        self.threads.clear();
    }

    fn evict_overflow(&mut self) -> Vec<ThreadKey> {
        let mut evicted = Vec::new();
        while self.threads.len() > self.max_stored_thread_contexts {
            let oldest = self
                .threads
                .values()
                .min_by_key(|c| c.revision)
                .map(|c| c.key.clone());
            let Some(key) = oldest else { break };
            self.threads.remove(&key);
            debug!(thread = %key, "evicted least recently updated thread");
            evicted.push(key);
        }
        evicted
    }
}
