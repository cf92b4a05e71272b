// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence of tasks, mention records and thread conversations.

use async_trait::async_trait;

use crate::error::TetherError;
use crate::types::{MentionRecord, Task, ThreadConversation, ThreadKey};

/// Best-effort snapshot store used by the executor.
///
/// Ordering contract: `load_tasks` and `load_mentions` return the most recent
/// `limit` entries oldest first.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Insert or replace a task by id.
    async fn upsert_task(&self, task: &Task) -> Result<(), TetherError>;

    /// Keep only the `keep` most recently created tasks.
    async fn prune_tasks(&self, keep: usize) -> Result<(), TetherError>;

    async fn load_tasks(&self, limit: usize) -> Result<Vec<Task>, TetherError>;

    async fn clear_tasks(&self) -> Result<(), TetherError>;

    /// Mark tasks left `queued` or `running` by a previous process as failed.
    /// Returns how many were updated.
    async fn fail_unfinished_tasks(&self, reason: &str) -> Result<usize, TetherError>;

    async fn append_mention(&self, record: &MentionRecord) -> Result<(), TetherError>;

    async fn prune_mentions(&self, keep: usize) -> Result<(), TetherError>;

    async fn load_mentions(&self, limit: usize) -> Result<Vec<MentionRecord>, TetherError>;

    async fn upsert_thread(&self, conversation: &ThreadConversation) -> Result<(), TetherError>;

    async fn delete_thread(&self, key: &ThreadKey) -> Result<(), TetherError>;

    async fn load_threads(&self) -> Result<Vec<ThreadConversation>, TetherError>;

    async fn clear_threads(&self) -> Result<(), TetherError>;
}
