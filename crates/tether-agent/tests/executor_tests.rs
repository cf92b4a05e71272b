// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Executor behavior against mock collaborators.

use std::sync::Arc;

use tether_agent::{Collaborators, EMPTY_OUTPUT_PLACEHOLDER, Executor};
use tether_config::TetherConfig;
use tether_core::{Role, RunError, TaskStatus, ThreadKey, Trigger};
use tether_test_utils::{MemoryHistoryStore, MockReplySink, MockRunner, RecordingNotifier};

struct Harness {
    runner: Arc<MockRunner>,
    reply: Arc<MockReplySink>,
    history: Arc<MemoryHistoryStore>,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    fn new(runner: MockRunner) -> Self {
        Self {
            runner: Arc::new(runner),
            reply: Arc::new(MockReplySink::new()),
            history: Arc::new(MemoryHistoryStore::new()),
            notifier: Arc::new(RecordingNotifier::new()),
        }
    }

    fn executor(&self, config: &TetherConfig) -> Executor {
        Executor::new(
            config,
            Collaborators {
                runner: self.runner.clone(),
                reply: self.reply.clone(),
                history: self.history.clone(),
                notifier: self.notifier.clone(),
            },
        )
    }
}

fn trigger(thread: &str, ts: &str, prompt: &str) -> Trigger {
    Trigger {
        channel: "C0123ABCD".into(),
        message_ts: ts.into(),
        thread_ts: thread.into(),
        prompt: prompt.into(),
    }
}

#[tokio::test]
async fn success_posts_trimmed_reply_in_thread() {
    let harness = Harness::new(MockRunner::with_script([Ok("  all green\n".to_string())]));
    let mut executor = harness.executor(&TetherConfig::default());

    let task = executor.process(trigger("100.1", "100.1", "run tests")).await;

    assert_eq!(task.status, TaskStatus::Succeeded);
    assert_eq!(task.response_text.as_deref(), Some("all green"));
    assert!(task.started_at.is_some() && task.finished_at.is_some());

    let posted = harness.reply.posted().await;
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].text, "all green");
    assert_eq!(posted[0].thread_ts.as_deref(), Some("100.1"));

    let stored = harness.history.tasks().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, TaskStatus::Succeeded);
}

#[tokio::test]
async fn whitespace_output_uses_placeholder() {
    let harness = Harness::new(MockRunner::with_script([Ok(" \n\t".to_string())]));
    let mut executor = harness.executor(&TetherConfig::default());

    let task = executor.process(trigger("1.0", "1.0", "anything")).await;

    assert_eq!(task.response_text.as_deref(), Some(EMPTY_OUTPUT_PLACEHOLDER));
    assert_eq!(harness.reply.posted().await[0].text, EMPTY_OUTPUT_PLACEHOLDER);
}

#[tokio::test]
async fn runner_failure_posts_error_and_records_turns() {
    let harness = Harness::new(MockRunner::with_script([Err(RunError::NonZeroExit {
        code: 2,
        message: "boom".into(),
    })]));
    let mut executor = harness.executor(&TetherConfig::default());

    let task = executor.process(trigger("5.0", "5.1", "deploy")).await;

    assert_eq!(task.status, TaskStatus::Failed);
    let error = task.error.clone().unwrap();
    assert!(error.contains("boom"), "got {error}");

    let posted = harness.reply.posted().await;
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].text, format!(":x: Execution failed: {error}"));
    assert_eq!(posted[0].thread_ts.as_deref(), Some("5.0"));

    let conversation = executor
        .memory()
        .get(&ThreadKey::new("C0123ABCD", "5.0"))
        .cloned()
        .unwrap();
    assert_eq!(conversation.turns.len(), 2);
    assert_eq!(conversation.turns[0].role, Role::User);
    assert_eq!(conversation.turns[0].text, "deploy");
    assert_eq!(conversation.turns[1].text, format!("Execution failed: {error}"));
    assert!(harness.notifier.sent().await.is_empty());
}

#[tokio::test]
async fn reply_failure_marks_task_failed() {
    let harness = Harness::new(MockRunner::with_script([Ok("done".to_string())]));
    harness.reply.set_failing(true);
    let mut executor = harness.executor(&TetherConfig::default());

    let task = executor.process(trigger("7.0", "7.0", "ship it")).await;

    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.error.as_deref().unwrap().contains("channel_not_found"));
    // The answer and the best-effort error reply were both attempted.
    assert_eq!(harness.reply.posted().await.len(), 2);
    let stored = harness.history.tasks().await;
    assert_eq!(stored[0].status, TaskStatus::Failed);
}

#[tokio::test]
async fn follow_up_prompt_carries_thread_history() {
    let harness = Harness::new(MockRunner::with_script([
        Ok("staging is up".to_string()),
        Ok("prod is up".to_string()),
    ]));
    let mut executor = harness.executor(&TetherConfig::default());

    executor.process(trigger("9.0", "9.0", "deploy staging")).await;
    executor.process(trigger("9.0", "9.5", "now prod")).await;
    executor.process(trigger("10.0", "10.0", "fresh thread")).await;

    let prompts = harness.runner.prompts().await;
    assert_eq!(prompts[0], "deploy staging");
    assert!(prompts[1].contains("User: deploy staging"));
    assert!(prompts[1].contains("Assistant: staging is up"));
    assert!(prompts[1].contains("now prod"));
    assert_eq!(prompts[2], "fresh thread");

    let threads = harness.history.threads().await;
    let thread = threads
        .iter()
        .find(|t| t.key == ThreadKey::new("C0123ABCD", "9.0"))
        .unwrap();
    assert_eq!(thread.turns.len(), 4);
}

#[tokio::test]
async fn evicted_threads_are_deleted_from_the_store() {
    let harness = Harness::new(MockRunner::new());
    let mut config = TetherConfig::default();
    config.memory.max_stored_thread_contexts = 1;
    let mut executor = harness.executor(&config);

    executor.process(trigger("1.0", "1.0", "first")).await;
    executor.process(trigger("2.0", "2.0", "second")).await;

    let threads = harness.history.threads().await;
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].key.thread_ts, "2.0");
    assert_eq!(executor.memory().len(), 1);
}

#[tokio::test]
async fn completion_notification_respects_setting() {
    let harness = Harness::new(MockRunner::new());
    let mut executor = harness.executor(&TetherConfig::default());
    executor.process(trigger("1.0", "1.0", "hello")).await;

    let sent = harness.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].0.ends_with("task completed"));
    assert!(sent[0].1.contains("C0123ABCD"));

    let quiet = Harness::new(MockRunner::new());
    let mut config = TetherConfig::default();
    config.notify.on_completion = false;
    let mut executor = quiet.executor(&config);
    executor.process(trigger("1.0", "1.0", "hello")).await;
    assert!(quiet.notifier.sent().await.is_empty());
}

#[tokio::test]
async fn task_history_is_capped() {
    let harness = Harness::new(MockRunner::new());
    let mut config = TetherConfig::default();
    config.history.max_history_items = 2;
    let mut executor = harness.executor(&config);

    for n in 0..4 {
        let ts = format!("{n}.0");
        executor.process(trigger(&ts, &ts, &format!("job {n}"))).await;
    }

    assert_eq!(executor.tasks().len(), 2);
    let stored = harness.history.tasks().await;
    let texts: Vec<_> = stored.iter().map(|t| t.request_text.as_str()).collect();
    assert_eq!(texts, ["job 2", "job 3"]);
}

#[tokio::test]
async fn subscribers_see_every_transition() {
    let harness = Harness::new(MockRunner::new());
    let mut executor = harness.executor(&TetherConfig::default());
    let mut updates = executor.subscribe();

    executor.process(trigger("1.0", "1.0", "hello")).await;

    assert_eq!(updates.recv().await.unwrap().status, TaskStatus::Running);
    assert_eq!(updates.recv().await.unwrap().status, TaskStatus::Succeeded);
}
