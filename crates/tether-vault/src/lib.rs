// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential storage for Tether.
//!
//! Slack tokens are kept in an AES-256-GCM vault inside the history database,
//! unlocked with a passphrase from `TETHER_VAULT_KEY` or a terminal prompt.
//! When the vault cannot be used, a plaintext `secrets.json` with owner-only
//! permissions takes over and a warning is logged.

pub mod cipher;
pub mod kdf;
pub mod passphrase;
pub mod store;
pub mod vault;

pub use passphrase::{PASSPHRASE_ENV_VAR, passphrase_from_env, read_passphrase};
pub use store::{FallbackSecretStore, FileSecretStore, VaultSecretStore, fallback_path};
pub use vault::Vault;
