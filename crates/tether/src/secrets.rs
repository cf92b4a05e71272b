// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack token resolution.
//!
//! A token set in configuration (file or `TETHER_SLACK_*`) wins. Otherwise it
//! is read from the secret store: the encrypted vault when a passphrase is
//! available, then the plaintext fallback file.

use secrecy::SecretString;
use tether_config::TetherConfig;
use tether_core::{SecretField, SecretStore, TetherError};
use tether_storage::Database;
use tether_vault::FallbackSecretStore;
use tracing::debug;

/// Both tokens needed to run the bridge.
pub struct SlackTokens {
    pub app: SecretString,
    pub bot: SecretString,
}

/// Open the secret store that shares the history database.
pub async fn open_secret_store(
    config: &TetherConfig,
    db: &Database,
    passphrase: Option<SecretString>,
) -> FallbackSecretStore {
    let path = tether_vault::fallback_path(&config.vault, &config.history);
    FallbackSecretStore::open(db.connection().clone(), passphrase, &config.vault, path).await
}

/// The configured value if non-blank, else whatever the store holds.
pub async fn resolve_secret(
    configured: Option<&str>,
    store: &dyn SecretStore,
    field: SecretField,
) -> Result<Option<SecretString>, TetherError> {
    if let Some(value) = configured.map(str::trim).filter(|v| !v.is_empty()) {
        debug!(%field, "using token from configuration");
        return Ok(Some(SecretString::from(value.to_string())));
    }
    store.load(field).await
}

pub async fn resolve_slack_tokens(
    config: &TetherConfig,
    store: &dyn SecretStore,
) -> Result<SlackTokens, TetherError> {
    let app = resolve_secret(config.slack.app_token.as_deref(), store, SecretField::AppToken)
        .await?
        .ok_or_else(|| missing(SecretField::AppToken))?;
    let bot = resolve_secret(config.slack.bot_token.as_deref(), store, SecretField::BotToken)
        .await?
        .ok_or_else(|| missing(SecretField::BotToken))?;
    Ok(SlackTokens { app, bot })
}

fn missing(field: SecretField) -> TetherError {
    TetherError::Config(format!(
        "no Slack {field} found; set slack.{field} in tether.toml, \
         TETHER_SLACK_{} in the environment, or run `tether secret set {field}`",
        field.to_string().to_uppercase()
    ))
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;
    use tether_vault::FileSecretStore;

    use super::*;

    #[tokio::test]
    async fn configured_token_wins_over_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path().join("secrets.json"));
        store
            .save(SecretField::BotToken, &SecretString::from("xoxb-stored"))
            .await
            .unwrap();

        let token = resolve_secret(Some(" xoxb-config "), &store, SecretField::BotToken)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.expose_secret(), "xoxb-config");

        let token = resolve_secret(Some("  "), &store, SecretField::BotToken)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.expose_secret(), "xoxb-stored");
    }

    #[tokio::test]
    async fn missing_token_names_every_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path().join("secrets.json"));
        let mut config = TetherConfig::default();
        config.slack.app_token = Some("xapp-1".into());

        let err = resolve_slack_tokens(&config, &store).await.err().unwrap();
        let message = err.to_string();
        assert!(message.contains("TETHER_SLACK_BOT_TOKEN"), "got {message}");
        assert!(message.contains("tether secret set bot_token"), "got {message}");
    }
}
