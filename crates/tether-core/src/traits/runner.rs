// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent invocation.

use async_trait::async_trait;

use crate::error::RunError;
use crate::types::RunOutput;

/// Runs one prompt against the external agent.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(&self, prompt: &str) -> Result<RunOutput, RunError>;
}
