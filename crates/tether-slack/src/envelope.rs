// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Socket Mode wire types and frame classification.
//!
//! [`process_frame`] is the pure core of the receive loop: given one text
//! frame it decides what to acknowledge and what, if anything, to forward.

use serde::{Deserialize, Serialize};
use tether_core::{EventKind, InboundEvent};

/// Envelope wrapping every Socket Mode frame.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketEnvelope {
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Option<EnvelopePayload>,
    /// Present on `disconnect` frames, e.g. `refresh_requested`.
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvelopePayload {
    #[serde(default)]
    pub event: Option<SlackEvent>,
}

/// The subset of a Slack event the bridge reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
}

/// Acknowledgment sent back for every envelope carrying an id.
#[derive(Debug, Serialize)]
pub struct Ack<'a> {
    pub envelope_id: &'a str,
}

/// Message subtypes that still represent a human-authored message.
const FORWARDED_MESSAGE_SUBTYPES: &[&str] = &["thread_broadcast", "file_share"];

/// What the receive loop should do with one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameAction {
    /// Connection greeting; nothing to forward.
    Hello,
    /// A mention-shaped event to hand to the router.
    Forward(InboundEvent),
    /// Valid frame that is not forwarded.
    Skip(String),
    /// Frame body could not be decoded.
    Malformed(String),
    /// The platform asked us to drop this connection.
    Disconnect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Serialized ack to send before anything else, if the envelope had an id.
    pub ack: Option<String>,
    pub action: FrameAction,
}

/// Classify one text frame.
pub fn process_frame(text: &str, bot_user_id: Option<&str>) -> FrameOutcome {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            return FrameOutcome {
                ack: None,
                action: FrameAction::Malformed(format!("invalid JSON frame: {e}")),
            };
        }
    };

    // Acknowledge before interpreting anything else, so a body we cannot read
    // is still not redelivered.
    let ack = value
        .get("envelope_id")
        .and_then(|id| id.as_str())
        .and_then(|id| serde_json::to_string(&Ack { envelope_id: id }).ok());

    let envelope: SocketEnvelope = match serde_json::from_value(value) {
        Ok(envelope) => envelope,
        Err(e) => {
            return FrameOutcome {
                ack,
                action: FrameAction::Malformed(format!("unreadable envelope: {e}")),
            };
        }
    };

    let action = match envelope.kind.as_str() {
        "hello" => FrameAction::Hello,
        "disconnect" => FrameAction::Disconnect(
            envelope
                .reason
                .unwrap_or_else(|| "disconnect requested".to_string()),
        ),
        "events_api" => match envelope.payload.and_then(|p| p.event) {
            Some(event) => match to_inbound_event(event, bot_user_id) {
                Ok(event) => FrameAction::Forward(event),
                Err(reason) => FrameAction::Skip(reason),
            },
            None => FrameAction::Skip("events_api frame without event".to_string()),
        },
        other => FrameAction::Skip(format!("unhandled envelope type `{other}`")),
    };

    FrameOutcome { ack, action }
}

/// Validate and convert a raw event. `Err` carries the skip reason.
pub fn to_inbound_event(event: SlackEvent, bot_user_id: Option<&str>) -> Result<InboundEvent, String> {
    if event.bot_id.is_some() {
        return Err("event authored by a bot".to_string());
    }
    let from_self = matches!((event.user.as_deref(), bot_user_id), (Some(user), Some(bot)) if user == bot);
    if from_self {
        return Err("event authored by this bot".to_string());
    }

    let kind = match event.kind.as_str() {
        "app_mention" => EventKind::AppMention,
        "message" => match event.subtype.as_deref() {
            None => EventKind::Message,
            Some(sub) if FORWARDED_MESSAGE_SUBTYPES.contains(&sub) => EventKind::Message,
            Some(sub) => return Err(format!("message subtype `{sub}` is not forwarded")),
        },
        other => return Err(format!("event type `{other}` is not forwarded")),
    };

    let (Some(channel), Some(ts), Some(text)) = (event.channel, event.ts, event.text) else {
        return Err("event is missing channel, ts or text".to_string());
    };

    Ok(InboundEvent {
        kind,
        channel,
        ts,
        thread_ts: event.thread_ts,
        user: event.user,
        text,
        from_self: false,
    })
}

/// `apps.connections.open` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionsOpenResponse {
    pub ok: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `auth.test` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTestResponse {
    pub ok: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `chat.postMessage` request body.
#[derive(Debug, Serialize)]
pub struct PostMessageRequest<'a> {
    pub channel: &'a str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<&'a str>,
}

/// `chat.postMessage` response.
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageResponse {
    pub ok: bool,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
