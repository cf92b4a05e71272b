// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-consumer FIFO task queue.
//!
//! Submissions never block. One background task owns the [`Executor`] and
//! works items strictly in submission order, so at most one agent run is in
//! flight at any time.

use tether_core::{MentionRecord, Task, TetherError, Trigger};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::executor::Executor;

/// Work accepted by the queue consumer.
#[derive(Debug, Clone)]
pub enum QueueItem {
    /// Run the agent for an accepted mention.
    Run(Trigger),
    /// Store an audit record. Handled in order with runs.
    Mention(MentionRecord),
}

/// Cloneable submission side of a [`TaskQueue`].
#[derive(Debug, Clone)]
pub struct QueueHandle {
    pub(crate) tx: mpsc::UnboundedSender<QueueItem>,
}

impl QueueHandle {
    /// Append a trigger to the queue. Fails only after shutdown.
    pub fn submit(&self, trigger: Trigger) -> Result<(), TetherError> {
        self.send(QueueItem::Run(trigger))
    }

    pub fn record_mention(&self, record: MentionRecord) -> Result<(), TetherError> {
        self.send(QueueItem::Mention(record))
    }

    fn send(&self, item: QueueItem) -> Result<(), TetherError> {
        self.tx
            .send(item)
            .map_err(|_| TetherError::Internal("task queue is shut down".to_string()))
    }
}

pub struct TaskQueue {
    handle: QueueHandle,
    processing: watch::Receiver<bool>,
    updates: broadcast::Sender<Task>,
    consumer: JoinHandle<Executor>,
}

impl TaskQueue {
    /// Spawn the consumer. Must be called within a Tokio runtime.
    pub fn start(executor: Executor) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (processing_tx, processing) = watch::channel(false);
        let updates = executor.updates();
        let consumer = tokio::spawn(consume(executor, rx, processing_tx));
        Self {
            handle: QueueHandle { tx },
            processing,
            updates,
            consumer,
        }
    }

    pub fn handle(&self) -> QueueHandle {
        self.handle.clone()
    }

    pub fn submit(&self, trigger: Trigger) -> Result<(), TetherError> {
        self.handle.submit(trigger)
    }

    pub fn record_mention(&self, record: MentionRecord) -> Result<(), TetherError> {
        self.handle.record_mention(record)
    }

    /// True while the consumer is working an item or has more queued.
    pub fn is_processing(&self) -> bool {
        *self.processing.borrow()
    }

    pub fn processing_state(&self) -> watch::Receiver<bool> {
        self.processing.clone()
    }

    /// Task snapshots after every transition.
    pub fn subscribe(&self) -> broadcast::Receiver<Task> {
        self.updates.subscribe()
    }

    /// Stop accepting work, drain what is queued and hand back the executor.
    ///
    /// Every [`QueueHandle`] must be dropped first or this waits forever.
    pub async fn shutdown(self) -> Result<Executor, TetherError> {
        let Self { handle, consumer, .. } = self;
        drop(handle);
        consumer
            .await
            .map_err(|e| TetherError::Internal(format!("task queue consumer failed: {e}")))
    }
}

async fn consume(
    mut executor: Executor,
    mut rx: mpsc::UnboundedReceiver<QueueItem>,
    processing: watch::Sender<bool>,
) -> Executor {
    while let Some(first) = rx.recv().await {
        processing.send_replace(true);
        let mut next = Some(first);
        while let Some(item) = next {
            handle_item(&mut executor, item).await;
            next = rx.try_recv().ok();
        }
        processing.send_replace(false);
        debug!("task queue idle");
    }
    info!("task queue stopped");
    executor
}

async fn handle_item(executor: &mut Executor, item: QueueItem) {
    match item {
        QueueItem::Run(trigger) => {
            executor.process(trigger).await;
        }
        QueueItem::Mention(record) => executor.record_mention(record).await,
    }
}
