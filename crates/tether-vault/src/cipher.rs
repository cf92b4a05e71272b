// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM with a fresh random nonce per sealed value.

use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use tether_core::TetherError;

pub const KEY_LEN: usize = 32;

/// A ciphertext (tag appended) and the nonce it was sealed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_LEN],
}

impl Sealed {
    /// Rebuild from stored columns, checking the nonce length.
    pub fn from_parts(ciphertext: Vec<u8>, nonce: &[u8]) -> Result<Self, TetherError> {
        let nonce = nonce
            .try_into()
            .map_err(|_| TetherError::Vault(format!("stored nonce is {} bytes", nonce.len())))?;
        Ok(Self { ciphertext, nonce })
    }
}

/// An AES-256-GCM key ready for sealing and opening.
pub struct Cipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl Cipher {
    pub fn new(key: &[u8; KEY_LEN]) -> Result<Self, TetherError> {
        let unbound = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| TetherError::Vault("invalid AES-256-GCM key".to_string()))?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<Sealed, TetherError> {
        let nonce: [u8; NONCE_LEN] = random_bytes(&self.rng)?;
        let mut buffer = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(Nonce::assume_unique_for_key(nonce), Aad::empty(), &mut buffer)
            .map_err(|_| TetherError::Vault("encryption failed".to_string()))?;
        Ok(Sealed {
            ciphertext: buffer,
            nonce,
        })
    }

    /// Fails when the key is wrong or the data was modified.
    pub fn open(&self, sealed: &Sealed) -> Result<Vec<u8>, TetherError> {
        let mut buffer = sealed.ciphertext.clone();
        let plaintext = self
            .key
            .open_in_place(
                Nonce::assume_unique_for_key(sealed.nonce),
                Aad::empty(),
                &mut buffer,
            )
            .map_err(|_| TetherError::Vault("decryption failed: wrong key or corrupted data".to_string()))?;
        Ok(plaintext.to_vec())
    }
}

/// Fill an array from the system CSPRNG.
pub fn random_bytes<const N: usize>(rng: &SystemRandom) -> Result<[u8; N], TetherError> {
    let mut out = [0u8; N];
    rng.fill(&mut out)
        .map_err(|_| TetherError::Vault("system random source unavailable".to_string()))?;
    Ok(out)
}
