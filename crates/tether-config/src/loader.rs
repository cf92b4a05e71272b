// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loading and saving.
//!
//! Lookup order: `./tether.toml` > `~/.config/tether/tether.toml` >
//! `/etc/tether/tether.toml`, with `TETHER_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tether_core::TetherError;

use crate::model::TetherConfig;

const SYSTEM_CONFIG_PATH: &str = "/etc/tether/tether.toml";
const LOCAL_CONFIG_PATH: &str = "tether.toml";

/// Config sections, used to map `TETHER_<SECTION>_<KEY>` onto `section.key`.
const SECTIONS: &[&str] = &[
    "agent",
    "slack",
    "runner",
    "memory",
    "history",
    "notify",
    "reconnect",
    "vault",
];

/// Per-user config file path (`~/.config/tether/tether.toml`).
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tether").join("tether.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tether/tether.toml`
/// 3. `~/.config/tether/tether.toml`
/// 4. `./tether.toml`
/// 5. `TETHER_*` environment variables
pub fn load_config() -> Result<TetherConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TetherConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TetherConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TetherConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TetherConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TetherConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Write `config` as TOML to `path`, creating parent directories.
pub fn save_config_to_path(config: &TetherConfig, path: &Path) -> Result<(), TetherError> {
    let text = toml::to_string_pretty(config)
        .map_err(|e| TetherError::Config(format!("failed to serialize config: {e}")))?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            TetherError::Config(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    std::fs::write(path, text)
        .map_err(|e| TetherError::Config(format!("failed to write {}: {e}", path.display())))
}

/// Map `TETHER_SLACK_BOT_TOKEN` to `slack.bot_token`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that contain underscores survive intact.
fn env_provider() -> Env {
    Env::prefixed("TETHER_")
        .ignore(&["VAULT_KEY"])
        .map(|key| map_env_key(key.as_str()).into())
}

/// figment hands over the key with the prefix stripped but its case intact.
fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}
