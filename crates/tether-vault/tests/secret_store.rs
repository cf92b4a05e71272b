// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret resolution through the vault and the plaintext fallback.

use secrecy::{ExposeSecret, SecretString};
use tether_config::model::VaultConfig;
use tether_core::{SecretField, SecretStore};
use tether_storage::Database;
use tether_vault::FallbackSecretStore;

fn cheap_config() -> VaultConfig {
    VaultConfig {
        kdf_memory_cost: 8192,
        kdf_iterations: 1,
        kdf_parallelism: 1,
        ..VaultConfig::default()
    }
}

#[tokio::test]
async fn vault_backed_secrets_never_touch_the_fallback_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("tether.db")).await.unwrap();
    let fallback = dir.path().join("secrets.json");

    let store = FallbackSecretStore::open(
        db.connection().clone(),
        Some(SecretString::from("pass")),
        &cheap_config(),
        &fallback,
    )
    .await;
    assert!(store.has_vault());

    store
        .save(SecretField::AppToken, &SecretString::from("xapp-live"))
        .await
        .unwrap();
    assert!(!fallback.exists());

    let reopened = FallbackSecretStore::open(
        db.connection().clone(),
        Some(SecretString::from("pass")),
        &cheap_config(),
        &fallback,
    )
    .await;
    let token = reopened.load(SecretField::AppToken).await.unwrap().unwrap();
    assert_eq!(token.expose_secret(), "xapp-live");
}

#[tokio::test]
async fn missing_passphrase_uses_plaintext_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("tether.db")).await.unwrap();
    let fallback = dir.path().join("secrets.json");

    let store =
        FallbackSecretStore::open(db.connection().clone(), None, &cheap_config(), &fallback).await;
    assert!(!store.has_vault());

    store
        .save(SecretField::BotToken, &SecretString::from("xoxb-file"))
        .await
        .unwrap();
    assert!(fallback.exists());
    store.remove(SecretField::BotToken).await.unwrap();
    assert!(store.load(SecretField::BotToken).await.unwrap().is_none());
}

#[tokio::test]
async fn wrong_passphrase_degrades_to_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("tether.db")).await.unwrap();
    let fallback = dir.path().join("secrets.json");

    FallbackSecretStore::open(
        db.connection().clone(),
        Some(SecretString::from("first")),
        &cheap_config(),
        &fallback,
    )
    .await;
    let store = FallbackSecretStore::open(
        db.connection().clone(),
        Some(SecretString::from("second")),
        &cheap_config(),
        &fallback,
    )
    .await;
    assert!(!store.has_vault());
}
