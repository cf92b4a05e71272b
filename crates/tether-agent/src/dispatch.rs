// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bridges socket events to the task queue.
//!
//! The dispatcher is the only reader of the socket client's event channel. It
//! logs connection activity, drops duplicate deliveries, routes each event and
//! hands accepted triggers and audit records to the queue.

use std::collections::{HashSet, VecDeque};

use tether_core::InboundEvent;
use tether_slack::{MentionRouter, RouteDecision, SocketEvent};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::queue::QueueHandle;

/// Number of recent `(channel, ts)` pairs remembered for duplicate detection.
pub const DEDUPE_WINDOW: usize = 512;

/// What happened to one socket event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Connection or log notice.
    Notice,
    /// Same message already handled.
    Duplicate,
    /// Not addressed to the bot.
    Ignored,
    /// Addressed to the bot but rejected; an audit record was queued.
    Rejected,
    /// Trigger queued for execution.
    Queued,
}

/// Bounded set of recently seen message ids, evicting the oldest first.
#[derive(Debug)]
struct RecentMessages {
    order: VecDeque<(String, String)>,
    seen: HashSet<(String, String)>,
    capacity: usize,
}

impl RecentMessages {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    fn contains(&self, key: &(String, String)) -> bool {
        self.seen.contains(key)
    }

    fn insert(&mut self, key: (String, String)) {
        if !self.seen.insert(key.clone()) {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
    }
}

pub struct Dispatcher {
    router: MentionRouter,
    queue: QueueHandle,
    recent: RecentMessages,
    connected: bool,
}

impl Dispatcher {
    pub fn new(router: MentionRouter, queue: QueueHandle) -> Self {
        Self {
            router,
            queue,
            recent: RecentMessages::new(DEDUPE_WINDOW),
            connected: false,
        }
    }

    pub fn router(&self) -> &MentionRouter {
        &self.router
    }

    /// Last connection state reported by the socket client.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Update the bot identity used for mention detection.
    pub fn set_bot_user_id(&mut self, bot_user_id: Option<String>) {
        if self.router.bot_user_id() != bot_user_id.as_deref() {
            debug!(bot_user_id = ?bot_user_id, "bot identity updated");
            self.router.set_bot_user_id(bot_user_id);
        }
    }

    /// Handle one socket event.
    pub fn dispatch(&mut self, event: SocketEvent) -> Dispatched {
        match event {
            SocketEvent::ConnectionChanged(connected) => {
                self.connected = connected;
                info!(connected, "slack connection state changed");
                Dispatched::Notice
            }
            SocketEvent::Log(line) => {
                info!("{line}");
                Dispatched::Notice
            }
            SocketEvent::Event(event) => self.route(event),
        }
    }

    fn route(&mut self, event: InboundEvent) -> Dispatched {
        let key = (event.channel.clone(), event.ts.clone());
        if self.recent.contains(&key) {
            debug!(channel = %event.channel, ts = %event.ts, "duplicate delivery dropped");
            return Dispatched::Duplicate;
        }

        let decision = self.router.evaluate(&event);
        if decision == RouteDecision::NotAMention {
            return Dispatched::Ignored;
        }
        // Only mentions are remembered, so a later delivery of the same
        // message after the identity is known still gets routed.
        self.recent.insert(key);

        if let Some(record) = decision.mention_record(&event)
            && let Err(e) = self.queue.record_mention(record)
        {
            warn!(error = %e, "failed to queue mention record");
        }

        match decision {
            RouteDecision::Accepted(trigger) => {
                info!(channel = %trigger.channel, thread = %trigger.thread_ts, "mention queued");
                match self.queue.submit(trigger) {
                    Ok(()) => Dispatched::Queued,
                    Err(e) => {
                        warn!(error = %e, "failed to queue trigger");
                        Dispatched::Rejected
                    }
                }
            }
            RouteDecision::Rejected { reason, .. } => {
                info!(channel = %event.channel, %reason, "mention not queued");
                Dispatched::Rejected
            }
            RouteDecision::NotAMention => Dispatched::Ignored,
        }
    }

    /// Dispatch events until the channel closes or `cancel` fires.
    ///
    /// `identity` carries the bot user id resolved on each connect.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SocketEvent>,
        mut identity: watch::Receiver<Option<String>>,
        cancel: CancellationToken,
    ) {
        let initial = identity.borrow_and_update().clone();
        if initial.is_some() {
            self.set_bot_user_id(initial);
        }
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => event,
            };
            let Some(event) = event else { break };

            if identity.has_changed().unwrap_or(false) {
                let bot_user_id = identity.borrow_and_update().clone();
                self.set_bot_user_id(bot_user_id);
            }
            self.dispatch(event);
        }
        debug!("dispatcher stopped");
    }
}
