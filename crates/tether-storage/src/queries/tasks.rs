// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task history queries.

use rusqlite::params;
use tether_core::{Task, TaskStatus, TetherError};

use super::{format_time, limit_param, optional_time_column, parsed_column, time_column};
use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, channel, thread_ts, message_ts, request_text, status, \
                       created_at, started_at, finished_at, response_text, error";

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: parsed_column(row, 0)?,
        channel: row.get(1)?,
        thread_ts: row.get(2)?,
        message_ts: row.get(3)?,
        request_text: row.get(4)?,
        status: parsed_column(row, 5)?,
        created_at: time_column(row, 6)?,
        started_at: optional_time_column(row, 7)?,
        finished_at: optional_time_column(row, 8)?,
        response_text: row.get(9)?,
        error: row.get(10)?,
    })
}

/// Insert a task or update it in place, keeping its original position.
pub async fn upsert_task(db: &Database, task: &Task) -> Result<(), TetherError> {
    let task = task.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO tasks (id, channel, thread_ts, message_ts, request_text, status,
                                    created_at, started_at, finished_at, response_text, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(id) DO UPDATE SET
                    status = excluded.status,
                    started_at = excluded.started_at,
                    finished_at = excluded.finished_at,
                    response_text = excluded.response_text,
                    error = excluded.error",
                params![
                    task.id.to_string(),
                    task.channel,
                    task.thread_ts,
                    task.message_ts,
                    task.request_text,
                    task.status.to_string(),
                    format_time(&task.created_at),
                    task.started_at.as_ref().map(format_time),
                    task.finished_at.as_ref().map(format_time),
                    task.response_text,
                    task.error,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete all but the `keep` most recently created tasks.
pub async fn prune_tasks(db: &Database, keep: usize) -> Result<usize, TetherError> {
    let keep = limit_param(keep);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM tasks WHERE seq NOT IN
                    (SELECT seq FROM tasks ORDER BY seq DESC LIMIT ?1)",
                params![keep],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// The `limit` most recent tasks, oldest first.
pub async fn load_tasks(db: &Database, limit: usize) -> Result<Vec<Task>, TetherError> {
    let limit = limit_param(limit);
    db.connection()
        .call(move |conn| -> Result<Vec<Task>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM
                    (SELECT seq, {COLUMNS} FROM tasks ORDER BY seq DESC LIMIT ?1)
                 ORDER BY seq ASC"
            ))?;
            let rows = stmt.query_map(params![limit], row_to_task)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn clear_tasks(db: &Database) -> Result<usize, TetherError> {
    db.connection()
        .call(|conn| -> Result<usize, rusqlite::Error> { conn.execute("DELETE FROM tasks", []) })
        .await
        .map_err(map_tr_err)
}

/// Fail every task still `queued` or `running`, stamping `finished_at`.
pub async fn fail_unfinished_tasks(db: &Database, reason: &str) -> Result<usize, TetherError> {
    let reason = reason.to_string();
    let now = format_time(&chrono::Utc::now());
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE tasks SET status = ?1, error = ?2, finished_at = ?3
                 WHERE status IN (?4, ?5)",
                params![
                    TaskStatus::Failed.to_string(),
                    reason,
                    now,
                    TaskStatus::Queued.to_string(),
                    TaskStatus::Running.to_string(),
                ],
            )
        })
        .await
        .map_err(map_tr_err)
}
