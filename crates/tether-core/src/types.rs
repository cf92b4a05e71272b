// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the ingestion, routing and execution crates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Slack event subtypes that can carry a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Dedicated mention event type.
    AppMention,
    /// Plain channel message.
    Message,
}

/// A message event forwarded by the socket client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub kind: EventKind,
    pub channel: String,
    pub ts: String,
    pub thread_ts: Option<String>,
    pub user: Option<String>,
    pub text: String,
    /// Set when the event was authored by the bot itself. Such events are never
    /// triggers.
    #[serde(default)]
    pub from_self: bool,
}

impl InboundEvent {
    /// Thread the reply belongs in: the thread root if any, else the message itself.
    pub fn thread_id(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }
}

/// An accepted mention, ready to be queued for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub channel: String,
    pub message_ts: String,
    pub thread_ts: String,
    pub prompt: String,
}

impl Trigger {
    pub fn thread_key(&self) -> ThreadKey {
        ThreadKey::new(&self.channel, &self.thread_ts)
    }
}

/// Lifecycle of a task. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// One unit of agent work created from a [`Trigger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub channel: String,
    pub thread_ts: String,
    pub message_ts: String,
    pub request_text: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub response_text: Option<String>,
    pub error: Option<String>,
}

impl Task {
    /// Create a queued task for a trigger.
    pub fn from_trigger(trigger: &Trigger) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: trigger.channel.clone(),
            thread_ts: trigger.thread_ts.clone(),
            message_ts: trigger.message_ts.clone(),
            request_text: trigger.prompt.clone(),
            status: TaskStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            response_text: None,
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn succeed(&mut self, response: impl Into<String>) {
        self.status = TaskStatus::Succeeded;
        self.finished_at = Some(Utc::now());
        self.response_text = Some(response.into());
        self.error = None;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = TaskStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.response_text = None;
        self.error = Some(error.into());
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used when rendering a turn into a prompt.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Identifies one Slack thread: `(channel id, thread root ts)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadKey {
    pub channel: String,
    pub thread_ts: String,
}

impl ThreadKey {
    pub fn new(channel: impl Into<String>, thread_ts: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            thread_ts: thread_ts.into(),
        }
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.thread_ts)
    }
}

/// Turn history of one thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadConversation {
    pub key: ThreadKey,
    pub turns: Vec<ConversationTurn>,
    pub updated_at: DateTime<Utc>,
    /// Monotonic touch counter; the lowest revision is evicted first.
    #[serde(default)]
    pub revision: u64,
}

/// Outcome recorded for every event that passed the mention test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MentionStatus {
    Queued,
    IgnoredChannel,
    IgnoredEmptyPrompt,
}

/// Audit entry for a mention, accepted or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionRecord {
    pub id: Uuid,
    pub channel: String,
    pub message_ts: String,
    pub thread_ts: String,
    pub user: Option<String>,
    pub raw_text: String,
    pub prompt: String,
    pub received_at: DateTime<Utc>,
    pub status: MentionStatus,
}

impl MentionRecord {
    pub fn new(event: &InboundEvent, prompt: impl Into<String>, status: MentionStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: event.channel.clone(),
            message_ts: event.ts.clone(),
            thread_ts: event.thread_id().to_string(),
            user: event.user.clone(),
            raw_text: event.text.clone(),
            prompt: prompt.into(),
            received_at: Utc::now(),
            status,
        }
    }
}

/// Captured output of a successful agent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Credentials kept in the secret store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SecretField {
    /// App-level token (`xapp-…`) used for the Socket Mode handshake.
    AppToken,
    /// Bot token (`xoxb-…`) used for Web API calls.
    BotToken,
}
