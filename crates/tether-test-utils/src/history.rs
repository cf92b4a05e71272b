// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`HistoryStore`] with the same ordering rules as the SQLite one.

use async_trait::async_trait;
use tether_core::{
    HistoryStore, MentionRecord, Task, TetherError, ThreadConversation, ThreadKey,
};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    /// Insertion order; updates keep their position.
    tasks: Vec<Task>,
    mentions: Vec<MentionRecord>,
    threads: Vec<ThreadConversation>,
}

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    state: Mutex<State>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored task, oldest first.
    pub async fn tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.clone()
    }

    pub async fn mentions(&self) -> Vec<MentionRecord> {
        self.state.lock().await.mentions.clone()
    }

    pub async fn threads(&self) -> Vec<ThreadConversation> {
        self.state.lock().await.threads.clone()
    }
}

fn keep_last<T>(items: &mut Vec<T>, keep: usize) {
    if items.len() > keep {
        items.drain(..items.len() - keep);
    }
}

fn last_n<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    items[items.len().saturating_sub(n)..].to_vec()
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn upsert_task(&self, task: &Task) -> Result<(), TetherError> {
        let mut state = self.state.lock().await;
        match state.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task.clone(),
            None => state.tasks.push(task.clone()),
        }
        Ok(())
    }

    async fn prune_tasks(&self, keep: usize) -> Result<(), TetherError> {
        keep_last(&mut self.state.lock().await.tasks, keep);
        Ok(())
    }

    async fn load_tasks(&self, limit: usize) -> Result<Vec<Task>, TetherError> {
        Ok(last_n(&self.state.lock().await.tasks, limit))
    }

    async fn clear_tasks(&self) -> Result<(), TetherError> {
        self.state.lock().await.tasks.clear();
        Ok(())
    }

    async fn fail_unfinished_tasks(&self, reason: &str) -> Result<usize, TetherError> {
        let mut state = self.state.lock().await;
        let mut failed = 0;
        for task in state.tasks.iter_mut().filter(|t| !t.status.is_terminal()) {
            task.fail(reason);
            failed += 1;
        }
        Ok(failed)
    }

    async fn append_mention(&self, record: &MentionRecord) -> Result<(), TetherError> {
        self.state.lock().await.mentions.push(record.clone());
        Ok(())
    }

    async fn prune_mentions(&self, keep: usize) -> Result<(), TetherError> {
        keep_last(&mut self.state.lock().await.mentions, keep);
        Ok(())
    }

    async fn load_mentions(&self, limit: usize) -> Result<Vec<MentionRecord>, TetherError> {
        Ok(last_n(&self.state.lock().await.mentions, limit))
    }

    async fn upsert_thread(&self, conversation: &ThreadConversation) -> Result<(), TetherError> {
        let mut state = self.state.lock().await;
        state.threads.retain(|c| c.key != conversation.key);
        state.threads.push(conversation.clone());
        Ok(())
    }

    async fn delete_thread(&self, key: &ThreadKey) -> Result<(), TetherError> {
        self.state.lock().await.threads.retain(|c| &c.key != key);
        Ok(())
    }

    async fn load_threads(&self) -> Result<Vec<ThreadConversation>, TetherError> {
        let mut threads = self.state.lock().await.threads.clone();
        threads.sort_by_key(|c| c.revision);
        Ok(threads)
    }

    async fn clear_threads(&self) -> Result<(), TetherError> {
        self.state.lock().await.threads.clear();
        Ok(())
    }
}
