// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id passphrase stretching.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tether_config::model::VaultConfig;
use tether_core::TetherError;
use zeroize::Zeroizing;

use crate::cipher::KEY_LEN;

pub const SALT_LEN: usize = 16;

/// Argon2id cost parameters. Stored with the vault so a later config change
/// does not lock the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_cost: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl KdfParams {
    pub fn from_config(config: &VaultConfig) -> Self {
        Self {
            memory_cost: config.kdf_memory_cost,
            iterations: config.kdf_iterations,
            parallelism: config.kdf_parallelism,
        }
    }

    /// Derive a key-wrapping key from `passphrase` and `salt`.
    pub fn derive(
        &self,
        passphrase: &SecretString,
        salt: &[u8; SALT_LEN],
    ) -> Result<Zeroizing<[u8; KEY_LEN]>, TetherError> {
        let params = argon2::Params::new(
            self.memory_cost,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| TetherError::Vault(format!("invalid Argon2id parameters: {e}")))?;
        let hasher =
            argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        hasher
            .hash_password_into(passphrase.expose_secret().as_bytes(), salt, key.as_mut())
            .map_err(|e| TetherError::Vault(format!("key derivation failed: {e}")))?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHEAP: KdfParams = KdfParams {
        memory_cost: 8192,
        iterations: 1,
        parallelism: 1,
    };

    #[test]
    fn derivation_is_deterministic_per_salt() {
        let pass = SecretString::from("correct horse");
        let a = CHEAP.derive(&pass, &[1; SALT_LEN]).unwrap();
        let b = CHEAP.derive(&pass, &[1; SALT_LEN]).unwrap();
        let c = CHEAP.derive(&pass, &[2; SALT_LEN]).unwrap();
        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
    }

    #[test]
    fn params_come_from_config() {
        let params = KdfParams::from_config(&VaultConfig::default());
        assert_eq!(params.memory_cost, 65536);
        assert_eq!(params.iterations, 3);
    }

    #[test]
    fn zero_iterations_are_rejected() {
        let params = KdfParams { iterations: 0, ..CHEAP };
        assert!(params.derive(&SecretString::from("x"), &[0; SALT_LEN]).is_err());
    }
}
