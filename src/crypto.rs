//! # Crypto
//!
//! Symmetric encryption of extracted container specs.
//!
//! The transformation pipeline only sees the [`Encryptor`] trait. The default
//! gateway is [`AesGcmEncryptor`]: AES-256-GCM with a fresh random 96-bit nonce
//! per call. Ciphertext strings are standard base64 of `nonce || ciphertext || tag`.

use crate::constants::{KEY_LEN, NONCE_LEN};
use base64::{engine::general_purpose, Engine as _};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::error::Unspecified;
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Error returned by an [`Encryptor`]
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("failed to create AES-256-GCM key")]
    InvalidKey,
    #[error("failed to generate random nonce")]
    Nonce,
    #[error("AES-256-GCM encryption failed")]
    Seal,
    #[error("ciphertext is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("ciphertext is too short")]
    Truncated,
    #[error("AES-256-GCM decryption failed (wrong key or corrupted data)")]
    Open,
}

/// Error loading key material
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("encryption key is empty")]
    Empty,
    #[error("failed to read key file {}: {source}", path.display())]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Opaque symmetric-encryption service consumed by the transformer
pub trait Encryptor: Send + Sync + fmt::Debug {
    /// Encrypt `plaintext` and return the ciphertext as a printable string
    ///
    /// # Errors
    ///
    /// Returns an [`EncryptionError`] when the key is unusable, no nonce can
    /// be generated, or sealing fails.
    fn encrypt(&self, plaintext: &[u8]) -> Result<String, EncryptionError>;
}

/// 32-byte AES key, wiped from memory on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

impl SymmetricKey {
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a key from user-supplied material
    ///
    /// Base64 that decodes to exactly 32 bytes is used verbatim. Anything else
    /// is treated as a passphrase and hashed with SHA-256.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Empty`] for blank material.
    pub fn from_material(material: &str) -> Result<Self, KeyError> {
        let material = material.trim();
        if material.is_empty() {
            return Err(KeyError::Empty);
        }

        if let Ok(decoded) = general_purpose::STANDARD.decode(material) {
            let decoded = Zeroizing::new(decoded);
            if let Ok(bytes) = <[u8; KEY_LEN]>::try_from(decoded.as_slice()) {
                return Ok(Self(bytes));
            }
        }

        let digest = Sha256::digest(material.as_bytes());
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&digest);
        Ok(Self(bytes))
    }

    /// Load key material from a file (surrounding whitespace ignored)
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Read`] when the file cannot be read and
    /// [`KeyError::Empty`] when it holds only whitespace.
    pub fn from_file(path: &Path) -> Result<Self, KeyError> {
        let content = Zeroizing::new(std::fs::read_to_string(path).map_err(|source| {
            KeyError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?);
        Self::from_material(&content)
    }

    fn aead_key(&self) -> Result<LessSafeKey, EncryptionError> {
        let unbound = UnboundKey::new(&AES_256_GCM, &self.0)
            .map_err(|Unspecified| EncryptionError::InvalidKey)?;
        Ok(LessSafeKey::new(unbound))
    }
}

/// AES-256-GCM implementation of [`Encryptor`]
#[derive(Debug)]
pub struct AesGcmEncryptor {
    key: SymmetricKey,
    rng: SystemRandom,
}

impl AesGcmEncryptor {
    #[must_use]
    pub fn new(key: SymmetricKey) -> Self {
        Self {
            key,
            rng: SystemRandom::new(),
        }
    }

    /// Decrypt a string produced by [`Encryptor::encrypt`]
    ///
    /// # Errors
    ///
    /// Fails when the input is not base64, is too short to hold a nonce and
    /// tag, or does not authenticate under this key.
    pub fn decrypt(&self, ciphertext: &str) -> Result<Vec<u8>, EncryptionError> {
        let raw = general_purpose::STANDARD.decode(ciphertext.trim())?;
        if raw.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(EncryptionError::Truncated);
        }

        let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|Unspecified| EncryptionError::Truncated)?;

        let mut in_out = sealed.to_vec();
        let plaintext = self
            .key
            .aead_key()?
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|Unspecified| EncryptionError::Open)?;

        Ok(plaintext.to_vec())
    }
}

impl Encryptor for AesGcmEncryptor {
    fn encrypt(&self, plaintext: &[u8]) -> Result<String, EncryptionError> {
        let key = self.key.aead_key()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|Unspecified| EncryptionError::Nonce)?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        // Seal in place: the buffer is extended with the authentication tag.
        let mut in_out = plaintext.to_vec();
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|Unspecified| EncryptionError::Seal)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + in_out.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&in_out);
        Ok(general_purpose::STANDARD.encode(blob))
    }
}
