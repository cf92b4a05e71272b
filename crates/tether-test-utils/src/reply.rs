// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capturing [`ReplySink`].

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tether_core::{ReplySink, TetherError};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    pub text: String,
    pub thread_ts: Option<String>,
}

/// Records every post. While failing, posts are still recorded but return an
/// error.
#[derive(Debug, Default)]
pub struct MockReplySink {
    posted: Mutex<Vec<PostedMessage>>,
    failing: AtomicBool,
}

impl MockReplySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn posted(&self) -> Vec<PostedMessage> {
        self.posted.lock().await.clone()
    }
}

#[async_trait]
impl ReplySink for MockReplySink {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<String, TetherError> {
        let mut posted = self.posted.lock().await;
        posted.push(PostedMessage {
            channel: channel.to_string(),
            text: text.to_string(),
            thread_ts: thread_ts.map(str::to_string),
        });
        if self.failing.load(Ordering::SeqCst) {
            return Err(TetherError::slack("chat.postMessage failed: channel_not_found"));
        }
        Ok(format!("9000.{:04}", posted.len()))
    }
}
