// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use tether_core::Notifier;
use tracing::info;

/// Delivers notifications as structured log events.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, title: &str, body: &str) {
        info!(title, body, "notification");
    }
}
