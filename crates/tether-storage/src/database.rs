// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management.
//!
//! Migrations run on a short-lived blocking connection; afterwards every
//! query goes through the single `tokio-rusqlite` background thread owned by
//! [`Database`].

use std::path::{Path, PathBuf};

use tether_core::TetherError;
use tracing::{debug, info};

use crate::migrations::run_migrations;

const PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;
     PRAGMA foreign_keys = ON;
     PRAGMA busy_timeout = 5000;";

/// Handle to the history database. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: PathBuf,
}

impl Database {
    /// Open (creating if needed) the database at `path` and apply migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TetherError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| TetherError::Storage {
                source: Box::new(e),
            })?;
        }

        let migrate_path = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), TetherError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(|e| TetherError::Storage {
                    source: Box::new(e),
                })?;
            conn.execute_batch(PRAGMAS).map_err(|e| TetherError::Storage {
                source: Box::new(e),
            })?;
            run_migrations(&mut conn)
        })
        .await
        .map_err(|e| TetherError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(|e| TetherError::Storage {
                source: Box::new(e),
            })?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        info!(path = %path.display(), "history database opened");
        Ok(Self { conn, path })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), TetherError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(|e| TetherError::Storage {
            source: Box::new(e),
        })?;
        debug!("history database closed");
        Ok(())
    }
}

pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TetherError {
    TetherError::Storage {
        source: Box::new(e),
    }
}
