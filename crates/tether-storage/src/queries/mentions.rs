// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mention audit log queries.

use rusqlite::params;
use tether_core::{MentionRecord, TetherError};

use super::{format_time, limit_param, parsed_column, time_column};
use crate::database::{Database, map_tr_err};

pub async fn append_mention(db: &Database, record: &MentionRecord) -> Result<(), TetherError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT OR IGNORE INTO mention_records
                    (id, channel, message_ts, thread_ts, user_id, raw_text, prompt, received_at, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id.to_string(),
                    record.channel,
                    record.message_ts,
                    record.thread_ts,
                    record.user,
                    record.raw_text,
                    record.prompt,
                    format_time(&record.received_at),
                    record.status.to_string(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn prune_mentions(db: &Database, keep: usize) -> Result<usize, TetherError> {
    let keep = limit_param(keep);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM mention_records WHERE seq NOT IN
                    (SELECT seq FROM mention_records ORDER BY seq DESC LIMIT ?1)",
                params![keep],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// The `limit` most recent records, oldest first.
pub async fn load_mentions(db: &Database, limit: usize) -> Result<Vec<MentionRecord>, TetherError> {
    let limit = limit_param(limit);
    db.connection()
        .call(move |conn| -> Result<Vec<MentionRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, channel, message_ts, thread_ts, user_id, raw_text, prompt, received_at, status
                 FROM (SELECT * FROM mention_records ORDER BY seq DESC LIMIT ?1)
                 ORDER BY seq ASC",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(MentionRecord {
                    id: parsed_column(row, 0)?,
                    channel: row.get(1)?,
                    message_ts: row.get(2)?,
                    thread_ts: row.get(3)?,
                    user: row.get(4)?,
                    raw_text: row.get(5)?,
                    prompt: row.get(6)?,
                    received_at: time_column(row, 7)?,
                    status: parsed_column(row, 8)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
