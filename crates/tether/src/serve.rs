// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tether serve` command implementation.
//!
//! Opens the history database, recovers from an unclean stop, restores
//! conversation memory, then wires the socket client, dispatcher, task queue
//! and connection supervisor together until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tether_agent::{
    Collaborators, Dispatcher, Executor, LogNotifier, TaskQueue, install_signal_handler,
    wait_for_idle,
};
use tether_config::TetherConfig;
use tether_core::{HistoryStore, TetherError};
use tether_runner::ProcessRunner;
use tether_slack::{MentionRouter, SlackWebClient, SocketModeClient};
use tether_storage::SqliteHistoryStore;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::secrets::{open_secret_store, resolve_slack_tokens};
use crate::supervisor::ConnectionSupervisor;

/// Reason stored on tasks that were in flight when the process stopped.
pub const INTERRUPTED_REASON: &str = "interrupted by restart";

/// How long shutdown waits for a running agent before giving up.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn run_serve(config: TetherConfig, force_connect: bool) -> Result<(), TetherError> {
    init_tracing(&config.agent.log_level);
    info!(name = %config.agent.name, "starting tether serve");

    for entry in config.slack.invalid_channel_entries() {
        warn!(%entry, "ignoring invalid monitored channel entry");
    }

    let store = SqliteHistoryStore::open(&config.history).await?;
    let db = store.database().clone();
    let history: Arc<dyn HistoryStore> = Arc::new(store);
    recover_interrupted_tasks(history.as_ref()).await;

    let cancel = install_signal_handler();

    if !(config.slack.auto_connect || force_connect) {
        info!("slack.auto_connect is off; run `tether serve --connect` to connect");
        cancel.cancelled().await;
        return Ok(());
    }

    let secrets = open_secret_store(&config, &db, tether_vault::passphrase_from_env()).await;
    let tokens = resolve_slack_tokens(&config, &secrets).await?;

    let web = Arc::new(SlackWebClient::new(&config.slack.api_base_url, tokens.bot)?);
    let runner = Arc::new(ProcessRunner::from_config(&config.runner));
    info!(executable = %runner.executable().display(), "agent runner configured");

    let mut executor = Executor::new(
        &config,
        Collaborators {
            runner,
            reply: web.clone(),
            history: history.clone(),
            notifier: Arc::new(LogNotifier),
        },
    );
    restore_state(&mut executor, history.as_ref(), config.history.max_history_items).await;
    let queue = TaskQueue::start(executor);

    let (socket, events) = SocketModeClient::from_config(&config.slack)?;
    let socket = Arc::new(socket);
    let (identity_tx, identity_rx) = watch::channel(None);

    let dispatcher = Dispatcher::new(MentionRouter::from_config(&config.slack), queue.handle());
    let dispatch = tokio::spawn(dispatcher.run(events, identity_rx, cancel.clone()));

    ConnectionSupervisor::new(socket, web, tokens.app, identity_tx, &config.reconnect)
        .run(cancel.clone())
        .await;

    info!("shutting down");
    if let Err(e) = dispatch.await {
        warn!(error = %e, "dispatcher ended abnormally");
    }

    if wait_for_idle(queue.processing_state(), DRAIN_TIMEOUT).await {
        queue.shutdown().await?;
    } else {
        warn!("abandoning in-flight task; it will be marked interrupted on next start");
    }

    info!("tether stopped");
    Ok(())
}

/// Fail tasks left `queued`/`running` by a previous process.
async fn recover_interrupted_tasks(history: &dyn HistoryStore) {
    match history.fail_unfinished_tasks(INTERRUPTED_REASON).await {
        Ok(0) => {}
        Ok(count) => info!(count, "marked interrupted tasks as failed"),
        Err(e) => warn!(error = %e, "failed to recover interrupted tasks"),
    }
}

/// Load persisted memory, tasks and mentions into the executor.
async fn restore_state(executor: &mut Executor, history: &dyn HistoryStore, limit: usize) {
    match history.load_threads().await {
        Ok(threads) => executor.restore_memory(threads).await,
        Err(e) => warn!(error = %e, "failed to load thread conversations"),
    }
    match history.load_tasks(limit).await {
        Ok(tasks) => executor.restore_tasks(tasks),
        Err(e) => warn!(error = %e, "failed to load task history"),
    }
    match history.load_mentions(limit).await {
        Ok(records) => executor.restore_mentions(records),
        Err(e) => warn!(error = %e, "failed to load mention records"),
    }
}

/// `RUST_LOG` wins over `agent.log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tether={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use tether_core::{TaskStatus, Trigger};
    use tether_test_utils::MemoryHistoryStore;

    use super::*;

    fn trigger(ts: &str) -> Trigger {
        Trigger {
            channel: "C0123ABCD".into(),
            message_ts: ts.into(),
            thread_ts: ts.into(),
            prompt: "run".into(),
        }
    }

    #[tokio::test]
    async fn unfinished_tasks_are_failed_on_startup() {
        let store = MemoryHistoryStore::new();
        let mut running = tether_core::Task::from_trigger(&trigger("1.0"));
        running.start();
        let mut done = tether_core::Task::from_trigger(&trigger("2.0"));
        done.start();
        done.succeed("ok");
        store.upsert_task(&running).await.unwrap();
        store.upsert_task(&done).await.unwrap();

        recover_interrupted_tasks(&store).await;

        let tasks = store.tasks().await;
        assert_eq!(tasks[0].status, TaskStatus::Failed);
        assert_eq!(tasks[0].error.as_deref(), Some(INTERRUPTED_REASON));
        assert_eq!(tasks[1].status, TaskStatus::Succeeded);
    }
}
