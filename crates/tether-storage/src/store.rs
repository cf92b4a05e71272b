// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`HistoryStore`].

use async_trait::async_trait;
use tether_config::model::HistoryConfig;
use tether_core::{HistoryStore, MentionRecord, Task, TetherError, ThreadConversation, ThreadKey};
use tracing::debug;

use crate::database::Database;
use crate::queries;

#[derive(Clone)]
pub struct SqliteHistoryStore {
    db: Database,
}

impl SqliteHistoryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database named by `history.database_path`.
    pub async fn open(config: &HistoryConfig) -> Result<Self, TetherError> {
        let db = Database::open(&config.database_path).await?;
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn upsert_task(&self, task: &Task) -> Result<(), TetherError> {
        queries::tasks::upsert_task(&self.db, task).await
    }

    async fn prune_tasks(&self, keep: usize) -> Result<(), TetherError> {
        let removed = queries::tasks::prune_tasks(&self.db, keep).await?;
        if removed > 0 {
            debug!(removed, keep, "pruned task history");
        }
        Ok(())
    }

    async fn load_tasks(&self, limit: usize) -> Result<Vec<Task>, TetherError> {
        queries::tasks::load_tasks(&self.db, limit).await
    }

    async fn clear_tasks(&self) -> Result<(), TetherError> {
        queries::tasks::clear_tasks(&self.db).await.map(|_| ())
    }

    async fn fail_unfinished_tasks(&self, reason: &str) -> Result<usize, TetherError> {
        queries::tasks::fail_unfinished_tasks(&self.db, reason).await
    }

    async fn append_mention(&self, record: &MentionRecord) -> Result<(), TetherError> {
        queries::mentions::append_mention(&self.db, record).await
    }

    async fn prune_mentions(&self, keep: usize) -> Result<(), TetherError> {
        queries::mentions::prune_mentions(&self.db, keep).await.map(|_| ())
    }

    async fn load_mentions(&self, limit: usize) -> Result<Vec<MentionRecord>, TetherError> {
        queries::mentions::load_mentions(&self.db, limit).await
    }

    async fn upsert_thread(&self, conversation: &ThreadConversation) -> Result<(), TetherError> {
        queries::threads::upsert_thread(&self.db, conversation).await
    }

    async fn delete_thread(&self, key: &ThreadKey) -> Result<(), TetherError> {
        queries::threads::delete_thread(&self.db, key).await
    }

    async fn load_threads(&self) -> Result<Vec<ThreadConversation>, TetherError> {
        queries::threads::load_threads(&self.db).await
    }

    async fn clear_threads(&self) -> Result<(), TetherError> {
        queries::threads::clear_threads(&self.db).await.map(|_| ())
    }
}
