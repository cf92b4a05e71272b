// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack transport for Tether.
//!
//! - [`socket`]: Socket Mode connection, acknowledgments and event intake.
//! - [`envelope`]: wire types and pure frame classification.
//! - [`mention`]: which events become agent triggers.
//! - [`web`]: Web API client used for identity lookup and replies.

pub mod envelope;
pub mod mention;
pub mod socket;
pub mod web;

pub use mention::{MentionRouter, RejectionReason, RouteDecision};
pub use socket::{SocketEvent, SocketModeClient};
pub use web::{AuthIdentity, SlackWebClient};
