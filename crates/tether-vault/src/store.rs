// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`SecretStore`] implementations.
//!
//! [`FallbackSecretStore`] is what the binary uses: the vault when it can be
//! unlocked, and a plaintext `secrets.json` (mode 0600) when it cannot or when
//! a vault operation fails. Every use of the plaintext file is logged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tether_config::model::{HistoryConfig, VaultConfig};
use tether_core::{SecretField, SecretStore, TetherError};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::vault::Vault;

/// Where the plaintext fallback lives: `vault.fallback_path`, or
/// `secrets.json` next to the history database.
pub fn fallback_path(vault: &VaultConfig, history: &HistoryConfig) -> PathBuf {
    match &vault.fallback_path {
        Some(path) => PathBuf::from(path),
        None => Path::new(&history.database_path)
            .parent()
            .map(|dir| dir.join("secrets.json"))
            .unwrap_or_else(|| PathBuf::from("secrets.json")),
    }
}

/// Vault-backed store, one entry per [`SecretField`].
#[derive(Debug)]
pub struct VaultSecretStore {
    vault: Vault,
}

impl VaultSecretStore {
    pub fn new(vault: Vault) -> Self {
        Self { vault }
    }
}

#[async_trait]
impl SecretStore for VaultSecretStore {
    async fn load(&self, field: SecretField) -> Result<Option<SecretString>, TetherError> {
        self.vault.get(&field.to_string()).await
    }

    async fn save(&self, field: SecretField, value: &SecretString) -> Result<(), TetherError> {
        self.vault.put(&field.to_string(), value).await
    }

    async fn remove(&self, field: SecretField) -> Result<(), TetherError> {
        self.vault.remove(&field.to_string()).await.map(|_| ())
    }
}

/// Plaintext JSON map of field name to value.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, TetherError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                TetherError::Vault(format!("corrupted {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(TetherError::Storage {
                source: Box::new(e),
            }),
        }
    }

    /// Replace the file atomically: write a 0600 sibling, then rename it over
    /// the target.
    async fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), TetherError> {
        let io = |e: std::io::Error| TetherError::Storage {
            source: Box::new(e),
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io)?;
        }
        let bytes = serde_json::to_vec_pretty(map)
            .map_err(|e| TetherError::Internal(format!("failed to encode secrets: {e}")))?;

        let staging = self.staging_path();
        // Left behind by an interrupted write.
        match tokio::fs::remove_file(&staging).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io(e)),
        }

        let written = write_private(&staging, &bytes).await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(io(e));
        }
        tokio::fs::rename(&staging, &self.path).await.map_err(io)
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "secrets.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Create `path` (which must not exist) readable by the owner only and write
/// `bytes` to it.
async fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn load(&self, field: SecretField) -> Result<Option<SecretString>, TetherError> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_map()
            .await?
            .remove(&field.to_string())
            .map(SecretString::from))
    }

    async fn save(&self, field: SecretField, value: &SecretString) -> Result<(), TetherError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(field.to_string(), value.expose_secret().to_string());
        self.write_map(&map).await
    }

    async fn remove(&self, field: SecretField) -> Result<(), TetherError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(&field.to_string()).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}

/// Primary store with a plaintext file behind it.
pub struct FallbackSecretStore {
    primary: Option<Arc<dyn SecretStore>>,
    fallback: FileSecretStore,
}

impl FallbackSecretStore {
    pub fn new(primary: Option<Arc<dyn SecretStore>>, fallback: FileSecretStore) -> Self {
        if primary.is_none() {
            warn!(
                path = %fallback.path().display(),
                "vault unavailable, secrets are kept in a plaintext file"
            );
        }
        Self { primary, fallback }
    }

    /// Unlock or create the vault in `conn` with `passphrase`. Falls back to
    /// the file store alone when no passphrase is given or unlocking fails.
    pub async fn open(
        conn: tokio_rusqlite::Connection,
        passphrase: Option<SecretString>,
        config: &VaultConfig,
        fallback_path: impl Into<PathBuf>,
    ) -> Self {
        let fallback = FileSecretStore::new(fallback_path);
        let primary = match passphrase {
            Some(passphrase) => match Vault::open_or_create(conn, &passphrase, config).await {
                Ok(vault) => Some(Arc::new(VaultSecretStore::new(vault)) as Arc<dyn SecretStore>),
                Err(e) => {
                    warn!(error = %e, "failed to open vault");
                    None
                }
            },
            None => None,
        };
        Self::new(primary, fallback)
    }

    pub fn has_vault(&self) -> bool {
        self.primary.is_some()
    }
}

#[async_trait]
impl SecretStore for FallbackSecretStore {
    async fn load(&self, field: SecretField) -> Result<Option<SecretString>, TetherError> {
        if let Some(primary) = &self.primary {
            match primary.load(field).await {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => debug!(%field, "not in vault, checking fallback file"),
                Err(e) => warn!(%field, error = %e, "vault read failed, using fallback file"),
            }
        }
        self.fallback.load(field).await
    }

    async fn save(&self, field: SecretField, value: &SecretString) -> Result<(), TetherError> {
        if let Some(primary) = &self.primary {
            match primary.save(field, value).await {
                Ok(()) => {
                    // Drop any stale plaintext copy.
                    if let Err(e) = self.fallback.remove(field).await {
                        warn!(%field, error = %e, "failed to clear fallback copy");
                    }
                    return Ok(());
                }
                Err(e) => warn!(%field, error = %e, "vault write failed, using fallback file"),
            }
        }
        warn!(
            %field,
            path = %self.fallback.path().display(),
            "storing secret in plaintext fallback file"
        );
        self.fallback.save(field, value).await
    }

    async fn remove(&self, field: SecretField) -> Result<(), TetherError> {
        if let Some(primary) = &self.primary
            && let Err(e) = primary.remove(field).await
        {
            warn!(%field, error = %e, "vault delete failed");
        }
        self.fallback.remove(field).await
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    struct BrokenStore;

    #[async_trait]
    impl SecretStore for BrokenStore {
        async fn load(&self, _: SecretField) -> Result<Option<SecretString>, TetherError> {
            Err(TetherError::Vault("locked".into()))
        }
        async fn save(&self, _: SecretField, _: &SecretString) -> Result<(), TetherError> {
            Err(TetherError::Vault("locked".into()))
        }
        async fn remove(&self, _: SecretField) -> Result<(), TetherError> {
            Err(TetherError::Vault("locked".into()))
        }
    }

    #[test]
    fn fallback_sits_next_to_database_by_default() {
        let history = HistoryConfig {
            database_path: "/var/lib/tether/tether.db".into(),
            ..HistoryConfig::default()
        };
        assert_eq!(
            fallback_path(&VaultConfig::default(), &history),
            PathBuf::from("/var/lib/tether/secrets.json")
        );
        let vault = VaultConfig {
            fallback_path: Some("/tmp/s.json".into()),
            ..VaultConfig::default()
        };
        assert_eq!(fallback_path(&vault, &history), PathBuf::from("/tmp/s.json"));
    }

    #[tokio::test]
    async fn file_store_round_trip_is_private() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path().join("sub/secrets.json"));
        assert!(store.load(SecretField::AppToken).await.unwrap().is_none());

        store
            .save(SecretField::AppToken, &SecretString::from("xapp-1"))
            .await
            .unwrap();
        let value = store.load(SecretField::AppToken).await.unwrap().unwrap();
        assert_eq!(value.expose_secret(), "xapp-1");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        store.remove(SecretField::AppToken).await.unwrap();
        assert!(store.load(SecretField::AppToken).await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rewrite_replaces_loose_file_with_private_one() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        std::fs::write(&path, r#"{"app_token":"xapp-old","bot_token":"xoxb-keep"}"#).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        std::fs::write(dir.path().join("secrets.json.tmp"), "half-written").unwrap();

        let store = FileSecretStore::new(&path);
        store
            .save(SecretField::AppToken, &SecretString::from("xapp-new"))
            .await
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let on_disk: BTreeMap<String, String> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk["app_token"], "xapp-new");
        assert_eq!(on_disk["bot_token"], "xoxb-keep");
        assert!(!dir.path().join("secrets.json.tmp").exists());
    }

    #[tokio::test]
    #[traced_test]
    async fn failing_primary_falls_back_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackSecretStore::new(
            Some(Arc::new(BrokenStore)),
            FileSecretStore::new(dir.path().join("secrets.json")),
        );

        store
            .save(SecretField::BotToken, &SecretString::from("xoxb-9"))
            .await
            .unwrap();
        let value = store.load(SecretField::BotToken).await.unwrap().unwrap();
        assert_eq!(value.expose_secret(), "xoxb-9");
        assert!(logs_contain("vault write failed"));
        assert!(logs_contain("plaintext fallback file"));
    }
}
