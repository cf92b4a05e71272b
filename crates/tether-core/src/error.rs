// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tether bridge.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across Tether crates and collaborator traits.
#[derive(Debug, Error)]
pub enum TetherError {
    /// Configuration errors (invalid TOML, missing tokens, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database open, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Slack Web API errors (non-2xx status, `ok: false`, malformed body).
    #[error("slack error: {message}")]
    Slack {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Socket Mode connection establishment failed.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The external agent process failed.
    #[error(transparent)]
    Run(#[from] RunError),

    /// Secret vault errors (wrong passphrase, corrupted data, KDF failure).
    #[error("vault error: {0}")]
    Vault(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failures while opening the Socket Mode connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The handshake returned a URL that is not a usable WebSocket endpoint.
    #[error("invalid socket endpoint: {0}")]
    InvalidEndpoint(String),

    /// The platform refused the handshake.
    #[error("socket handshake rejected: {0}")]
    HandshakeRejected(String),

    /// Network or WebSocket transport failure.
    #[error("socket transport error: {0}")]
    Transport(String),
}

/// Failures of a single agent process invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// The configured path is missing or not executable.
    #[error("agent executable not found: {0}")]
    ExecutableNotFound(String),

    /// The process could not be launched.
    #[error("agent execution failed: {0}")]
    ExecutionFailed(String),

    /// The process exited with a non-zero status.
    #[error("agent exited with code {code}: {message}")]
    NonZeroExit { code: i32, message: String },

    /// The agent CLI reported that it needs an interactive sign-in.
    #[error("agent requires authentication (run `claude login` on the host): {0}")]
    AuthenticationRequired(String),

    /// The process exceeded the configured wall-clock limit and was killed.
    #[error("agent timed out after {0:?}")]
    TimedOut(Duration),
}

impl TetherError {
    /// Shorthand for a Slack error without an underlying source.
    pub fn slack(message: impl Into<String>) -> Self {
        Self::Slack {
            message: message.into(),
            source: None,
        }
    }
}
