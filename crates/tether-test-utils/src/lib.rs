// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for Tether integration tests.
//!
//! - [`MockRunner`]: scripted agent results, records prompts and peak concurrency
//! - [`MockReplySink`]: captures posted replies, can be told to fail
//! - [`MemoryHistoryStore`]: in-memory [`tether_core::HistoryStore`]
//! - [`RecordingNotifier`]: captures notifications

pub mod history;
pub mod notifier;
pub mod reply;
pub mod runner;

pub use history::MemoryHistoryStore;
pub use notifier::RecordingNotifier;
pub use reply::{MockReplySink, PostedMessage};
pub use runner::MockRunner;
