// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion notifications.

use async_trait::async_trait;

/// Fire-and-forget user notification. Delivery failures are the
/// implementation's concern and never reach the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, title: &str, body: &str);
}
