// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential storage.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::TetherError;
use crate::types::SecretField;

/// Keyed storage for the two Slack tokens.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Load a secret, `Ok(None)` when it was never stored.
    async fn load(&self, field: SecretField) -> Result<Option<SecretString>, TetherError>;

    async fn save(&self, field: SecretField, value: &SecretString) -> Result<(), TetherError>;

    async fn remove(&self, field: SecretField) -> Result<(), TetherError>;
}
