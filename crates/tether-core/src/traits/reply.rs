// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound reply delivery.

use async_trait::async_trait;

use crate::error::TetherError;

/// Posts text into a channel, optionally inside a thread.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Post `text` and return the platform timestamp of the new message.
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<String, TetherError>;
}
