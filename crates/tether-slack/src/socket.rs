// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Socket Mode client.
//!
//! [`SocketModeClient::connect`] performs the `apps.connections.open`
//! handshake, opens the WebSocket and spawns a single receive task. Every
//! envelope carrying an id is acknowledged before it is interpreted. Domain
//! events, log lines and connection changes are delivered in receipt order over
//! an unbounded channel.
//!
//! The client never reconnects on its own; a dropped connection is reported as
//! `ConnectionChanged(false)` and the caller decides what to do.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tether_config::model::SlackConfig;
use tether_core::{ConnectError, InboundEvent, TetherError};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::envelope::{ConnectionsOpenResponse, FrameAction, process_frame};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Everything the client reports to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    ConnectionChanged(bool),
    Log(String),
    Event(InboundEvent),
}

struct Session {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct SocketModeClient {
    http: reqwest::Client,
    api_base_url: String,
    events: mpsc::UnboundedSender<SocketEvent>,
    state: Arc<watch::Sender<bool>>,
    session: Mutex<Option<Session>>,
}

impl SocketModeClient {
    /// Create a client and the receiver for its events.
    pub fn new(
        api_base_url: impl Into<String>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SocketEvent>), TetherError> {
        let (events, rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(false);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TetherError::Slack {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        let client = Self {
            http,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            events,
            state: Arc::new(state),
            session: Mutex::new(None),
        };
        Ok((client, rx))
    }

    pub fn from_config(
        config: &SlackConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SocketEvent>), TetherError> {
        Self::new(&config.api_base_url)
    }

    /// Observe the connection state.
    pub fn connection_state(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.state.borrow()
    }

    /// Open a Socket Mode connection, replacing any existing one.
    ///
    /// `bot_user_id` is used to drop events authored by the bot itself.
    pub async fn connect(
        &self,
        app_token: &SecretString,
        bot_user_id: Option<String>,
    ) -> Result<(), ConnectError> {
        self.disconnect().await;
        self.log("opening Socket Mode connection");

        let url = self.open_connection(app_token).await?;
        let endpoint = validate_endpoint(&url)?;

        let (socket, _response) = tokio_tungstenite::connect_async(endpoint.as_str())
            .await
            .map_err(|e| ConnectError::Transport(e.to_string()))?;

        // Mark connected before the receive task can observe a close.
        mark_connected(&self.state, &self.events);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(receive_loop(
            socket,
            cancel.clone(),
            bot_user_id,
            self.events.clone(),
            Arc::clone(&self.state),
        ));
        *self.session.lock().await = Some(Session { cancel, task });

        info!(host = endpoint.host_str().unwrap_or_default(), "socket mode connected");
        Ok(())
    }

    /// Close the connection if one is open. Safe to call repeatedly.
    pub async fn disconnect(&self) {
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            session.cancel.cancel();
            if let Err(e) = session.task.await {
                warn!(error = %e, "socket receive task ended abnormally");
            }
        }
        mark_disconnected(&self.state, &self.events, "disconnected");
    }

    async fn open_connection(&self, app_token: &SecretString) -> Result<String, ConnectError> {
        let response = self
            .http
            .post(format!("{}/apps.connections.open", self.api_base_url))
            .bearer_auth(app_token.expose_secret())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .send()
            .await
            .map_err(|e| ConnectError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectError::HandshakeRejected(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        let body: ConnectionsOpenResponse = response
            .json()
            .await
            .map_err(|e| ConnectError::Transport(e.to_string()))?;

        match (body.ok, body.url) {
            (true, Some(url)) => Ok(url),
            (_, _) => Err(ConnectError::HandshakeRejected(
                body.error.unwrap_or_else(|| "unknown_error".to_string()),
            )),
        }
    }

    fn log(&self, line: impl Into<String>) {
        let _ = self.events.send(SocketEvent::Log(line.into()));
    }
}

/// The handshake URL must be a WebSocket endpoint.
fn validate_endpoint(raw: &str) -> Result<reqwest::Url, ConnectError> {
    let url = reqwest::Url::parse(raw)
        .map_err(|e| ConnectError::InvalidEndpoint(format!("{raw}: {e}")))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(ConnectError::InvalidEndpoint(format!(
            "{raw}: unsupported scheme `{other}`"
        ))),
    }
}

fn mark_connected(state: &watch::Sender<bool>, events: &mpsc::UnboundedSender<SocketEvent>) {
    if state.send_if_modified(|connected| !std::mem::replace(connected, true)) {
        let _ = events.send(SocketEvent::ConnectionChanged(true));
    }
}

fn mark_disconnected(
    state: &watch::Sender<bool>,
    events: &mpsc::UnboundedSender<SocketEvent>,
    reason: &str,
) {
    if state.send_if_modified(|connected| std::mem::replace(connected, false)) {
        info!(reason, "socket mode disconnected");
        let _ = events.send(SocketEvent::Log(format!("disconnected: {reason}")));
        let _ = events.send(SocketEvent::ConnectionChanged(false));
    }
}

async fn receive_loop(
    mut socket: Socket,
    cancel: CancellationToken,
    bot_user_id: Option<String>,
    events: mpsc::UnboundedSender<SocketEvent>,
    state: Arc<watch::Sender<bool>>,
) {
    let reason = loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = socket.close(None).await;
                break "closed locally".to_string();
            }
            frame = socket.next() => frame,
        };

        let text = match frame {
            Some(Ok(Message::Text(text))) => text.as_str().to_string(),
            Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => text,
                Err(_) => break "binary frame is not valid UTF-8".to_string(),
            },
            Some(Ok(Message::Close(frame))) => {
                break match frame {
                    Some(frame) => format!(
                        "closed by peer: {} {}",
                        u16::from(frame.code),
                        frame.reason.as_str()
                    ),
                    None => "closed by peer".to_string(),
                };
            }
            // tungstenite answers pings itself.
            Some(Ok(_)) => continue,
            Some(Err(e)) => break format!("transport error: {e}"),
            None => break "stream ended".to_string(),
        };

        if let Some(reason) = handle_text(&mut socket, &text, bot_user_id.as_deref(), &events).await
        {
            let _ = socket.close(None).await;
            break reason;
        }
    };

    mark_disconnected(&state, &events, &reason);
}

/// Process one text frame. Returns a reason when the connection must end.
async fn handle_text(
    socket: &mut Socket,
    text: &str,
    bot_user_id: Option<&str>,
    events: &mpsc::UnboundedSender<SocketEvent>,
) -> Option<String> {
    let outcome = process_frame(text, bot_user_id);

    if let Some(ack) = outcome.ack
        && let Err(e) = socket.send(Message::Text(ack.into())).await
    {
        warn!(error = %e, "failed to acknowledge envelope");
    }

    match outcome.action {
        FrameAction::Hello => {
            let _ = events.send(SocketEvent::Log("socket mode hello received".to_string()));
        }
        FrameAction::Forward(event) => {
            debug!(channel = %event.channel, ts = %event.ts, "forwarding event");
            let _ = events.send(SocketEvent::Event(event));
        }
        FrameAction::Skip(reason) => debug!(%reason, "frame skipped"),
        FrameAction::Malformed(reason) => {
            warn!(%reason, "malformed frame skipped");
            let _ = events.send(SocketEvent::Log(format!("malformed frame: {reason}")));
        }
        FrameAction::Disconnect(reason) => {
            return Some(format!("disconnect requested: {reason}"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_must_be_websocket() {
        assert!(validate_endpoint("wss://wss-primary.slack.com/link/?ticket=1").is_ok());
        assert!(validate_endpoint("ws://127.0.0.1:9000/").is_ok());
        assert!(matches!(
            validate_endpoint("https://slack.com/"),
            Err(ConnectError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            validate_endpoint("not a url"),
            Err(ConnectError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn state_changes_are_reported_once() {
        let (events, mut rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(false);

        mark_disconnected(&state, &events, "idle");
        assert!(rx.try_recv().is_err());

        mark_connected(&state, &events);
        mark_connected(&state, &events);
        assert_eq!(rx.try_recv().unwrap(), SocketEvent::ConnectionChanged(true));
        assert!(rx.try_recv().is_err());

        mark_disconnected(&state, &events, "bye");
        mark_disconnected(&state, &events, "bye");
        assert!(matches!(rx.try_recv().unwrap(), SocketEvent::Log(_)));
        assert_eq!(rx.try_recv().unwrap(), SocketEvent::ConnectionChanged(false));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_without_session_is_a_no_op() {
        let (client, mut rx) = SocketModeClient::new("http://127.0.0.1:1").unwrap();
        client.disconnect().await;
        client.disconnect().await;
        assert!(!client.is_connected());
        assert!(rx.try_recv().is_err());
    }
}
