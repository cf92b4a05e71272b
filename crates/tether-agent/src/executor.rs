// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs one trigger at a time: prompt augmentation, agent run, reply,
//! conversation memory and history persistence.
//!
//! The executor is owned by the queue consumer task, so all domain state
//! (tasks, memory, mention log) is mutated from one place.

use std::sync::Arc;

use tether_config::TetherConfig;
use tether_core::{
    AgentRunner, ConversationTurn, HistoryStore, MentionRecord, Notifier, ReplySink, Task,
    ThreadConversation, ThreadKey, Trigger,
};
use tether_memory::ConversationMemory;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::history::{MentionLog, TaskHistory};

/// Reply used when the agent succeeds with whitespace-only output.
pub const EMPTY_OUTPUT_PLACEHOLDER: &str = "The agent returned no visible output.";

/// Snapshots published after every task transition.
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// External services the executor talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub runner: Arc<dyn AgentRunner>,
    pub reply: Arc<dyn ReplySink>,
    pub history: Arc<dyn HistoryStore>,
    pub notifier: Arc<dyn Notifier>,
}

pub struct Executor {
    collaborators: Collaborators,
    agent_name: String,
    max_history_items: usize,
    notify_on_completion: bool,
    memory: ConversationMemory,
    tasks: TaskHistory,
    mentions: MentionLog,
    updates: broadcast::Sender<Task>,
}

impl Executor {
    pub fn new(config: &TetherConfig, collaborators: Collaborators) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let max_history_items = config.history.max_history_items.max(1);
        Self {
            collaborators,
            agent_name: config.agent.name.clone(),
            max_history_items,
            notify_on_completion: config.notify.on_completion,
            memory: ConversationMemory::from_config(&config.memory),
            tasks: TaskHistory::new(max_history_items),
            mentions: MentionLog::new(max_history_items),
            updates,
        }
    }

    /// Seed conversation memory with threads loaded at startup.
    ///
    /// Threads dropped by the current caps are also removed from the store.
    pub async fn restore_memory(&mut self, conversations: Vec<ThreadConversation>) {
        let evicted = self.memory.restore(conversations);
        self.forget_threads(&evicted).await;
        info!(threads = self.memory.len(), "conversation memory restored");
    }

    /// Seed the task view with persisted tasks (oldest first).
    pub fn restore_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks.restore(tasks);
    }

    pub fn restore_mentions(&mut self, records: Vec<MentionRecord>) {
        self.mentions.restore(records);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Task> {
        self.updates.subscribe()
    }

    pub(crate) fn updates(&self) -> broadcast::Sender<Task> {
        self.updates.clone()
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn tasks(&self) -> &TaskHistory {
        &self.tasks
    }

    pub fn mentions(&self) -> &MentionLog {
        &self.mentions
    }

    /// Keep an audit record for a routed mention.
    pub async fn record_mention(&mut self, record: MentionRecord) {
        let history = &self.collaborators.history;
        if let Err(e) = history.append_mention(&record).await {
            warn!(error = %e, "failed to persist mention record");
        } else if let Err(e) = history.prune_mentions(self.max_history_items).await {
            warn!(error = %e, "failed to prune mention records");
        }
        self.mentions.push(record);
    }

    /// Execute one trigger to completion and return the final task.
    pub async fn process(&mut self, trigger: Trigger) -> Task {
        let key = trigger.thread_key();
        let mut task = Task::from_trigger(&trigger);
        task.start();
        self.track(&task).await;
        info!(task_id = %task.id, thread = %key, "task started");

        let prompt = self.memory.augment(&key, &trigger.prompt);
        let augmented = prompt != trigger.prompt;
        debug!(task_id = %task.id, augmented, "prompt prepared");

        match self.run_and_reply(&trigger, &prompt).await {
            Ok(response) => {
                self.remember(
                    &key,
                    [
                        ConversationTurn::user(&trigger.prompt),
                        ConversationTurn::assistant(&response),
                    ],
                )
                .await;
                task.succeed(response);
                self.track(&task).await;
                info!(task_id = %task.id, "task succeeded");

                if self.notify_on_completion {
                    self.collaborators
                        .notifier
                        .send(
                            &format!("{}: task completed", self.agent_name),
                            &format!("channel={} replied", trigger.channel),
                        )
                        .await;
                }
            }
            Err(reason) => {
                let text = format!(":x: Execution failed: {reason}");
                if let Err(e) = self
                    .collaborators
                    .reply
                    .post_message(&trigger.channel, &text, Some(&trigger.thread_ts))
                    .await
                {
                    warn!(task_id = %task.id, error = %e, "failed to post error reply");
                }
                self.remember(
                    &key,
                    [
                        ConversationTurn::user(&trigger.prompt),
                        ConversationTurn::assistant(format!("Execution failed: {reason}")),
                    ],
                )
                .await;
                task.fail(reason);
                self.track(&task).await;
                warn!(task_id = %task.id, error = ?task.error, "task failed");
            }
        }

        task
    }

    /// Run the agent and post its answer. `Err` carries the failure reason.
    async fn run_and_reply(&self, trigger: &Trigger, prompt: &str) -> Result<String, String> {
        let output = self
            .collaborators
            .runner
            .run(prompt)
            .await
            .map_err(|e| e.to_string())?;

        let trimmed = output.stdout.trim();
        let response = if trimmed.is_empty() {
            EMPTY_OUTPUT_PLACEHOLDER.to_string()
        } else {
            trimmed.to_string()
        };

        self.collaborators
            .reply
            .post_message(&trigger.channel, &response, Some(&trigger.thread_ts))
            .await
            .map_err(|e| e.to_string())?;
        Ok(response)
    }

    async fn remember(&mut self, key: &ThreadKey, turns: [ConversationTurn; 2]) {
        let outcome = self.memory.record(key, turns);
        if let Err(e) = self.collaborators.history.upsert_thread(&outcome.conversation).await {
            warn!(thread = %key, error = %e, "failed to persist thread conversation");
        }
        self.forget_threads(&outcome.evicted).await;
    }

    async fn forget_threads(&self, keys: &[ThreadKey]) {
        for key in keys {
            if let Err(e) = self.collaborators.history.delete_thread(key).await {
                warn!(thread = %key, error = %e, "failed to delete evicted thread");
            }
        }
    }

    /// Record a task transition: in-memory view, store, observers.
    async fn track(&mut self, task: &Task) {
        self.tasks.upsert(task.clone());
        let history = &self.collaborators.history;
        if let Err(e) = history.upsert_task(task).await {
            warn!(task_id = %task.id, error = %e, "failed to persist task");
        } else if let Err(e) = history.prune_tasks(self.max_history_items).await {
            warn!(error = %e, "failed to prune task history");
        }
        // No subscribers is fine.
        let _ = self.updates.send(task.clone());
    }
}
