// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline maintenance commands: history, memory, config and secrets.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tether_config::TetherConfig;
use tether_core::{HistoryStore, SecretField, SecretStore, TetherError};
use tether_storage::{Database, SqliteHistoryStore};
use tether_vault::Vault;

const REDACTED: &str = "<redacted>";

pub async fn clear_history(config: &TetherConfig) -> Result<(), TetherError> {
    let store = SqliteHistoryStore::open(&config.history).await?;
    store.clear_tasks().await?;
    println!("tether: task history cleared");
    Ok(())
}

pub async fn clear_memory(config: &TetherConfig) -> Result<(), TetherError> {
    let store = SqliteHistoryStore::open(&config.history).await?;
    store.clear_threads().await?;
    println!("tether: thread conversations cleared");
    Ok(())
}

pub fn show_config(config: &TetherConfig) -> Result<(), TetherError> {
    let text = toml::to_string_pretty(&redacted(config))
        .map_err(|e| TetherError::Config(format!("failed to serialize config: {e}")))?;
    print!("{text}");
    Ok(())
}

/// Copy of `config` safe to print.
fn redacted(config: &TetherConfig) -> TetherConfig {
    let mut shown = config.clone();
    for token in [&mut shown.slack.app_token, &mut shown.slack.bot_token] {
        if token.is_some() {
            *token = Some(REDACTED.to_string());
        }
    }
    shown
}

pub fn init_config(path: Option<PathBuf>, force: bool) -> Result<(), TetherError> {
    let path = path
        .or_else(tether_config::user_config_path)
        .ok_or_else(|| TetherError::Config("cannot determine the user config directory".into()))?;
    write_default_config(&path, force)?;
    println!("tether: wrote {}", path.display());
    Ok(())
}

fn write_default_config(path: &Path, force: bool) -> Result<(), TetherError> {
    if path.exists() && !force {
        return Err(TetherError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    tether_config::save_config_to_path(&TetherConfig::default(), path)
}

pub async fn set_secret(config: &TetherConfig, field: SecretField) -> Result<(), TetherError> {
    let value = prompt_secret(field)?;
    let store = open_store(config).await?;
    store.save(field, &value).await?;
    println!("tether: {field} saved");
    Ok(())
}

pub async fn remove_secret(config: &TetherConfig, field: SecretField) -> Result<(), TetherError> {
    let store = open_store(config).await?;
    store.remove(field).await?;
    println!("tether: {field} removed");
    Ok(())
}

/// Secret store with the vault unlocked (or created) when a passphrase is
/// available from the environment or a terminal.
async fn open_store(config: &TetherConfig) -> Result<tether_vault::FallbackSecretStore, TetherError> {
    let db = Database::open(&config.history.database_path).await?;
    let passphrase = match tether_vault::passphrase_from_env() {
        Some(passphrase) => Some(passphrase),
        None if std::io::stdin().is_terminal() => {
            let creating = !Vault::exists(db.connection()).await?;
            Some(tether_vault::read_passphrase(creating)?)
        }
        None => None,
    };
    Ok(crate::secrets::open_secret_store(config, &db, passphrase).await)
}

fn prompt_secret(field: SecretField) -> Result<SecretString, TetherError> {
    let value = rpassword::prompt_password(format!("{field}: "))
        .map_err(|e| TetherError::Internal(format!("failed to read {field}: {e}")))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(TetherError::Config(format!("empty {field} not saved")));
    }
    Ok(SecretString::from(value.to_string()))
}
