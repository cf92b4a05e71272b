// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::TetherConfig;

/// Check semantic constraints serde cannot express.
///
/// Collects every problem instead of failing on the first one. Invalid
/// monitored-channel entries are not errors here: they are filtered out and
/// reported as warnings by the caller.
pub fn validate_config(config: &TetherConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |key: &str, message: String| {
        errors.push(ConfigError::Validation {
            key: key.to_string(),
            message,
        });
    };

    if config.runner.executable_path.trim().is_empty() {
        fail("runner.executable_path", "must not be empty".into());
    }

    if config.memory.max_turns_per_thread_context == 0 {
        fail(
            "memory.max_turns_per_thread_context",
            "must be at least 1".into(),
        );
    }
    if config.memory.max_stored_thread_contexts == 0 {
        fail(
            "memory.max_stored_thread_contexts",
            "must be at least 1".into(),
        );
    }

    if config.history.max_history_items == 0 {
        fail("history.max_history_items", "must be at least 1".into());
    }
    if config.history.database_path.trim().is_empty() {
        fail("history.database_path", "must not be empty".into());
    }

    let base = config.slack.api_base_url.trim();
    if !(base.starts_with("https://") || base.starts_with("http://")) {
        fail(
            "slack.api_base_url",
            format!("`{base}` is not an http(s) URL"),
        );
    }

    if config.reconnect.initial_backoff_secs == 0 {
        fail("reconnect.initial_backoff_secs", "must be at least 1".into());
    }
    if config.reconnect.max_backoff_secs < config.reconnect.initial_backoff_secs {
        fail(
            "reconnect.max_backoff_secs",
            format!(
                "must be >= reconnect.initial_backoff_secs ({})",
                config.reconnect.initial_backoff_secs
            ),
        );
    }

    if config.vault.kdf_memory_cost < 32768 {
        fail(
            "vault.kdf_memory_cost",
            format!(
                "must be at least 32768 (32 MiB), got {}",
                config.vault.kdf_memory_cost
            ),
        );
    }
    if config.vault.kdf_iterations < 2 {
        fail(
            "vault.kdf_iterations",
            format!("must be at least 2, got {}", config.vault.kdf_iterations),
        );
    }
    if config.vault.kdf_parallelism == 0 {
        fail("vault.kdf_parallelism", "must be at least 1".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
