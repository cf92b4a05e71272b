// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Tether, the Slack-to-agent bridge.
//!
//! This crate provides the error types, the domain types that flow through the
//! ingestion and execution pipeline, and the collaborator traits the executor
//! depends on.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ConnectError, RunError, TetherError};
pub use types::{
    ConversationTurn, EventKind, InboundEvent, MentionRecord, MentionStatus, Role, RunOutput,
    SecretField, Task, TaskStatus, ThreadConversation, ThreadKey, Trigger,
};

pub use traits::{AgentRunner, HistoryStore, Notifier, ReplySink, SecretStore};
