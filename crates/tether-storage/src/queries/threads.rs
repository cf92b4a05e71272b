// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread conversation snapshot queries.

use rusqlite::params;
use rusqlite::types::Type;
use tether_core::{ConversationTurn, TetherError, ThreadConversation, ThreadKey};

use super::{format_time, time_column};
use crate::database::{Database, map_tr_err};

pub async fn upsert_thread(db: &Database, conversation: &ThreadConversation) -> Result<(), TetherError> {
    let turns = serde_json::to_string(&conversation.turns).map_err(|e| TetherError::Storage {
        source: Box::new(e),
    })?;
    let channel = conversation.key.channel.clone();
    let thread_ts = conversation.key.thread_ts.clone();
    let updated_at = format_time(&conversation.updated_at);
    let revision = i64::try_from(conversation.revision).unwrap_or(i64::MAX);

    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO thread_conversations (channel, thread_ts, turns, updated_at, revision)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(channel, thread_ts) DO UPDATE SET
                    turns = excluded.turns,
                    updated_at = excluded.updated_at,
                    revision = excluded.revision",
                params![channel, thread_ts, turns, updated_at, revision],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_thread(db: &Database, key: &ThreadKey) -> Result<(), TetherError> {
    let key = key.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "DELETE FROM thread_conversations WHERE channel = ?1 AND thread_ts = ?2",
                params![key.channel, key.thread_ts],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All stored threads, least recently updated first.
pub async fn load_threads(db: &Database) -> Result<Vec<ThreadConversation>, TetherError> {
    db.connection()
        .call(|conn| -> Result<Vec<ThreadConversation>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT channel, thread_ts, turns, updated_at, revision
                 FROM thread_conversations ORDER BY revision ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                let raw_turns: String = row.get(2)?;
                let turns: Vec<ConversationTurn> = serde_json::from_str(&raw_turns).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
                })?;
                let revision: i64 = row.get(4)?;
                Ok(ThreadConversation {
                    key: ThreadKey::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
                    turns,
                    updated_at: time_column(row, 3)?,
                    revision: u64::try_from(revision).unwrap_or(0),
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn clear_threads(db: &Database) -> Result<usize, TetherError> {
    db.connection()
        .call(|conn| -> Result<usize, rusqlite::Error> {
            conn.execute("DELETE FROM thread_conversations", [])
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn conversation(thread: &str, revision: u64) -> ThreadConversation {
        ThreadConversation {
            key: ThreadKey::new("C0123ABCD", thread),
            turns: vec![
                ConversationTurn::user("what changed?"),
                ConversationTurn::assistant("two files"),
            ],
            updated_at: Utc::now(),
            revision,
        }
    }

    #[tokio::test]
    async fn threads_persist_in_revision_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).await.unwrap();

        upsert_thread(&db, &conversation("2.0", 7)).await.unwrap();
        upsert_thread(&db, &conversation("1.0", 3)).await.unwrap();
        let mut updated = conversation("1.0", 9);
        updated.turns.push(ConversationTurn::user("which ones?"));
        upsert_thread(&db, &updated).await.unwrap();

        let loaded = load_threads(&db).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].key.thread_ts, "2.0");
        assert_eq!(loaded[1].turns.len(), 3);
        assert_eq!(loaded[1].revision, 9);

        delete_thread(&db, &ThreadKey::new("C0123ABCD", "2.0")).await.unwrap();
        assert_eq!(load_threads(&db).await.unwrap().len(), 1);
        assert_eq!(clear_threads(&db).await.unwrap(), 1);
    }
}
