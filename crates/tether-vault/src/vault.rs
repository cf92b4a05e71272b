// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Passphrase-protected secret vault stored in the history database.
//!
//! A random master key encrypts every entry. The master key is stored sealed
//! under a key derived from the passphrase, so changing Argon2id settings in
//! the config never invalidates an existing vault: the parameters used at
//! creation are stored alongside it.

use std::collections::HashMap;

use ring::rand::SystemRandom;
use rusqlite::params;
use secrecy::{ExposeSecret, SecretString};
use tether_config::model::VaultConfig;
use tether_core::TetherError;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::cipher::{Cipher, KEY_LEN, Sealed, random_bytes};
use crate::kdf::{KdfParams, SALT_LEN};

const META_MASTER_KEY: &str = "master_key";
const META_MASTER_NONCE: &str = "master_key_nonce";
const META_SALT: &str = "kdf_salt";
const META_PARAMS: &str = "kdf_params";

/// An unlocked vault. Only the master-key cipher is held in memory.
pub struct Vault {
    cipher: Cipher,
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault").finish_non_exhaustive()
    }
}

fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TetherError {
    TetherError::Storage {
        source: Box::new(e),
    }
}

async fn read_meta(
    conn: &tokio_rusqlite::Connection,
) -> Result<HashMap<String, Vec<u8>>, TetherError> {
    conn.call(|conn| -> Result<HashMap<String, Vec<u8>>, rusqlite::Error> {
        let mut stmt = conn.prepare("SELECT key, value FROM vault_meta")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    })
    .await
    .map_err(map_tr_err)
}

fn meta_field<'a>(meta: &'a HashMap<String, Vec<u8>>, key: &str) -> Result<&'a [u8], TetherError> {
    meta.get(key)
        .map(Vec::as_slice)
        .ok_or_else(|| TetherError::Vault(format!("vault metadata is missing `{key}`")))
}

impl Vault {
    /// Whether a vault has been created in this database.
    pub async fn exists(conn: &tokio_rusqlite::Connection) -> Result<bool, TetherError> {
        Ok(read_meta(conn).await?.contains_key(META_MASTER_KEY))
    }

    /// Unlock the vault if it exists, otherwise create it.
    pub async fn open_or_create(
        conn: tokio_rusqlite::Connection,
        passphrase: &SecretString,
        config: &VaultConfig,
    ) -> Result<Self, TetherError> {
        if Self::exists(&conn).await? {
            Self::unlock(conn, passphrase).await
        } else {
            Self::create(conn, passphrase, config).await
        }
    }

    pub async fn create(
        conn: tokio_rusqlite::Connection,
        passphrase: &SecretString,
        config: &VaultConfig,
    ) -> Result<Self, TetherError> {
        let rng = SystemRandom::new();
        let master_key: Zeroizing<[u8; KEY_LEN]> = Zeroizing::new(random_bytes(&rng)?);
        let salt: [u8; SALT_LEN] = random_bytes(&rng)?;
        let params = KdfParams::from_config(config);

        let wrapping_key = params.derive(passphrase, &salt)?;
        let wrapped = Cipher::new(&wrapping_key)?.seal(master_key.as_slice())?;
        let params_json = serde_json::to_vec(&params)
            .map_err(|e| TetherError::Vault(format!("failed to encode KDF parameters: {e}")))?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            for (key, value) in [
                (META_MASTER_KEY, wrapped.ciphertext),
                (META_MASTER_NONCE, wrapped.nonce.to_vec()),
                (META_SALT, salt.to_vec()),
                (META_PARAMS, params_json),
            ] {
                tx.execute(
                    "INSERT OR REPLACE INTO vault_meta (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )?;
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)?;

        info!("vault created");
        Ok(Self {
            cipher: Cipher::new(&master_key)?,
            conn,
        })
    }

    /// Unlock with `passphrase`. A wrong passphrase is a `Vault` error.
    pub async fn unlock(
        conn: tokio_rusqlite::Connection,
        passphrase: &SecretString,
    ) -> Result<Self, TetherError> {
        let meta = read_meta(&conn).await?;
        let params: KdfParams = serde_json::from_slice(meta_field(&meta, META_PARAMS)?)
            .map_err(|e| TetherError::Vault(format!("corrupted KDF parameters: {e}")))?;
        let salt: [u8; SALT_LEN] = meta_field(&meta, META_SALT)?
            .try_into()
            .map_err(|_| TetherError::Vault("corrupted KDF salt".to_string()))?;
        let wrapped = Sealed::from_parts(
            meta_field(&meta, META_MASTER_KEY)?.to_vec(),
            meta_field(&meta, META_MASTER_NONCE)?,
        )?;

        let wrapping_key = params.derive(passphrase, &salt)?;
        let master_key = Zeroizing::new(
            Cipher::new(&wrapping_key)?
                .open(&wrapped)
                .map_err(|_| TetherError::Vault("wrong passphrase or corrupted vault".to_string()))?,
        );
        let master_key: &[u8; KEY_LEN] = master_key
            .as_slice()
            .try_into()
            .map_err(|_| TetherError::Vault("corrupted master key".to_string()))?;

        debug!("vault unlocked");
        Ok(Self {
            cipher: Cipher::new(master_key)?,
            conn,
        })
    }

    /// Store or replace a secret.
    pub async fn put(&self, name: &str, value: &SecretString) -> Result<(), TetherError> {
        let sealed = self.cipher.seal(value.expose_secret().as_bytes())?;
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO vault_entries (name, ciphertext, nonce) VALUES (?1, ?2, ?3)
                     ON CONFLICT(name) DO UPDATE SET
                        ciphertext = excluded.ciphertext,
                        nonce = excluded.nonce,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                    params![name, sealed.ciphertext, sealed.nonce.to_vec()],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    pub async fn get(&self, name: &str) -> Result<Option<SecretString>, TetherError> {
        let name = name.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(Vec<u8>, Vec<u8>)>, rusqlite::Error> {
                match conn.query_row(
                    "SELECT ciphertext, nonce FROM vault_entries WHERE name = ?1",
                    params![name],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                ) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)?;

        let Some((ciphertext, nonce)) = row else {
            return Ok(None);
        };
        let plaintext = Zeroizing::new(self.cipher.open(&Sealed::from_parts(ciphertext, &nonce)?)?);
        let value = String::from_utf8(plaintext.to_vec())
            .map_err(|_| TetherError::Vault("stored secret is not UTF-8".to_string()))?;
        Ok(Some(SecretString::from(value)))
    }

    /// Returns whether an entry was removed.
    pub async fn remove(&self, name: &str) -> Result<bool, TetherError> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute("DELETE FROM vault_entries WHERE name = ?1", params![name])
            })
            .await
            .map(|removed| removed > 0)
            .map_err(map_tr_err)
    }

    pub async fn names(&self) -> Result<Vec<String>, TetherError> {
        self.conn
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare("SELECT name FROM vault_entries ORDER BY name")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_config() -> VaultConfig {
        VaultConfig {
            kdf_memory_cost: 8192,
            kdf_iterations: 1,
            kdf_parallelism: 1,
            ..VaultConfig::default()
        }
    }

    async fn open_test_db() -> (tokio_rusqlite::Connection, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = tether_storage::Database::open(dir.path().join("vault.db"))
            .await
            .unwrap();
        (db.connection().clone(), dir)
    }

    #[tokio::test]
    async fn secrets_survive_relock() {
        let (conn, _dir) = open_test_db().await;
        let passphrase = SecretString::from("hunter2");
        assert!(!Vault::exists(&conn).await.unwrap());

        let vault = Vault::open_or_create(conn.clone(), &passphrase, &cheap_config())
            .await
            .unwrap();
        vault.put("bot_token", &SecretString::from("xoxb-1")).await.unwrap();
        vault.put("bot_token", &SecretString::from("xoxb-2")).await.unwrap();
        drop(vault);

        assert!(Vault::exists(&conn).await.unwrap());
        let vault = Vault::open_or_create(conn, &passphrase, &cheap_config())
            .await
            .unwrap();
        let token = vault.get("bot_token").await.unwrap().unwrap();
        assert_eq!(token.expose_secret(), "xoxb-2");
        assert_eq!(vault.names().await.unwrap(), ["bot_token"]);

        assert!(vault.remove("bot_token").await.unwrap());
        assert!(!vault.remove("bot_token").await.unwrap());
        assert!(vault.get("bot_token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_passphrase_does_not_unlock() {
        let (conn, _dir) = open_test_db().await;
        Vault::create(conn.clone(), &SecretString::from("right"), &cheap_config())
            .await
            .unwrap();
        let err = Vault::unlock(conn, &SecretString::from("wrong")).await.unwrap_err();
        assert!(err.to_string().contains("wrong passphrase"), "got {err}");
    }
}
