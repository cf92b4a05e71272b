// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for Tether.
//!
//! WAL-mode SQLite with embedded refinery migrations and a single
//! `tokio-rusqlite` connection. Holds the task history, the mention audit log,
//! per-thread conversation snapshots and the vault tables.

pub mod database;
pub mod migrations;
pub mod queries;
pub mod store;

pub use database::Database;
pub use store::SqliteHistoryStore;
