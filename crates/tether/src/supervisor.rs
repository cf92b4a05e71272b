// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keeps the Socket Mode connection up.
//!
//! Each attempt resolves the bot identity with `auth.test`, publishes it for
//! the dispatcher and opens a new socket. A lost connection is retried with
//! exponential backoff that resets after every successful connect.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tether_config::model::ReconnectConfig;
use tether_core::TetherError;
use tether_slack::{SlackWebClient, SocketModeClient};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Doubling delay between attempts, capped at a maximum.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.max(Duration::from_secs(1));
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(
            Duration::from_secs(config.initial_backoff_secs),
            Duration::from_secs(config.max_backoff_secs),
        )
    }

    /// Delay before the next attempt; doubles the one after it.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

pub struct ConnectionSupervisor {
    socket: Arc<SocketModeClient>,
    web: Arc<SlackWebClient>,
    app_token: SecretString,
    identity: watch::Sender<Option<String>>,
    reconnect: bool,
    backoff: Backoff,
}

impl ConnectionSupervisor {
    pub fn new(
        socket: Arc<SocketModeClient>,
        web: Arc<SlackWebClient>,
        app_token: SecretString,
        identity: watch::Sender<Option<String>>,
        config: &ReconnectConfig,
    ) -> Self {
        Self {
            socket,
            web,
            app_token,
            identity,
            reconnect: config.enabled,
            backoff: Backoff::from_config(config),
        }
    }

    /// Run until `cancel` fires. Leaves the socket disconnected.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut state = self.socket.connection_state();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.connect_once().await {
                Ok(()) => {
                    self.backoff.reset();
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = state.wait_for(|connected| !connected) => {}
                    }
                    warn!("slack connection lost");
                }
                Err(e) => warn!(error = %e, "slack connection attempt failed"),
            }

            if !self.reconnect {
                info!("reconnect disabled, staying offline until shutdown");
                cancel.cancelled().await;
                break;
            }

            let delay = self.backoff.next_delay();
            info!(delay_secs = delay.as_secs(), "reconnecting after backoff");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.socket.disconnect().await;
    }

    async fn connect_once(&self) -> Result<(), TetherError> {
        let identity = self.web.auth_test().await?;
        info!(
            bot_user_id = %identity.user_id,
            team = identity.team.as_deref().unwrap_or("-"),
            "slack authentication succeeded"
        );
        self.identity.send_replace(Some(identity.user_id.clone()));
        self.socket
            .connect(&self.app_token, Some(identity.user_id))
            .await?;
        Ok(())
    }
}
