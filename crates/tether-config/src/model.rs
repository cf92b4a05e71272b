// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

use crate::channels;

/// Top-level Tether configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TetherConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Slack credentials and channel filtering.
    #[serde(default)]
    pub slack: SlackConfig,

    /// External agent process settings.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Per-thread conversation memory bounds.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Task and mention history persistence.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Completion notifications.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Reconnect policy applied by `tether serve`.
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Credential vault settings.
    #[serde(default)]
    pub vault: VaultConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Name used in log lines and notifications.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "tether".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Slack connection settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SlackConfig {
    /// App-level token (`xapp-…`). Takes precedence over the secret store.
    #[serde(default)]
    pub app_token: Option<String>,

    /// Bot token (`xoxb-…`). Takes precedence over the secret store.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Channel allowlist. Empty means every channel. Entries may hold several
    /// comma-separated ids and may be written as `#C0123ABCD`.
    #[serde(default)]
    pub monitored_channels: Vec<String>,

    /// Web API base URL, without a trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Connect as soon as `tether serve` starts.
    #[serde(default = "default_true")]
    pub auto_connect: bool,

    /// Optional text prefix that also triggers the agent, e.g. `!claude`.
    #[serde(default)]
    pub command_prefix: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            app_token: None,
            bot_token: None,
            monitored_channels: Vec::new(),
            api_base_url: default_api_base_url(),
            auto_connect: true,
            command_prefix: String::new(),
        }
    }
}

impl SlackConfig {
    /// Valid, normalized allowlist entries.
    pub fn normalized_channel_ids(&self) -> Vec<String> {
        channels::normalized_channel_ids(&self.monitored_channels)
    }

    /// Raw allowlist entries that do not normalize to a valid channel id.
    pub fn invalid_channel_entries(&self) -> Vec<String> {
        channels::invalid_channel_entries(&self.monitored_channels)
    }
}

fn default_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_true() -> bool {
    true
}

/// External agent process configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Absolute path of the agent executable.
    #[serde(default = "default_executable_path")]
    pub executable_path: String,

    /// Arguments placed before the prompt.
    #[serde(default = "default_prompt_args")]
    pub prompt_args: Vec<String>,

    /// Wall-clock limit per invocation in seconds. `0` disables the limit.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            executable_path: default_executable_path(),
            prompt_args: default_prompt_args(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_executable_path() -> String {
    "/usr/local/bin/claude".to_string()
}

fn default_prompt_args() -> Vec<String> {
    vec!["-p".to_string()]
}

fn default_timeout_secs() -> u64 {
    600
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Turns included in an augmented prompt. Threads keep twice as many.
    #[serde(default = "default_max_turns")]
    pub max_turns_per_thread_context: usize,

    /// Threads remembered before the least recently updated is evicted.
    #[serde(default = "default_max_threads")]
    pub max_stored_thread_contexts: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_turns_per_thread_context: default_max_turns(),
            max_stored_thread_contexts: default_max_threads(),
        }
    }
}

fn default_max_turns() -> usize {
    6
}

fn default_max_threads() -> usize {
    200
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Cap for both the task history and the mention log.
    #[serde(default = "default_max_history_items")]
    pub max_history_items: usize,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history_items: default_max_history_items(),
            database_path: default_database_path(),
        }
    }
}

fn default_max_history_items() -> usize {
    100
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tether").join("tether.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tether.db"))
        .to_string_lossy()
        .into_owned()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Emit a notification after each successful reply.
    #[serde(default = "default_true")]
    pub on_completion: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            on_completion: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: u64,

    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_backoff_secs: default_initial_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

fn default_initial_backoff_secs() -> u64 {
    1
}

fn default_max_backoff_secs() -> u64 {
    60
}

/// Credential vault configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB).
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id iteration count.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id parallelism lanes.
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,

    /// Plaintext file used when the vault cannot be opened. Defaults to
    /// `secrets.json` next to the database.
    #[serde(default)]
    pub fallback_path: Option<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
            fallback_path: None,
        }
    }
}

fn default_kdf_memory_cost() -> u32 {
    65536
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    4
}
