//! Authenticated encryption of JSON documents
//!
//! Every document is serialized to JSON, sealed with a fresh random nonce
//! and written as a text envelope. Two AEADs are supported:
//! - AES-256-GCM with a 16-byte nonce (default, matches existing data files)
//! - ChaCha20-Poly1305 with a 12-byte nonce
//!
//! Decryption picks the cipher from the envelope's nonce length, so a data
//! directory may hold both.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use chacha20poly1305::ChaCha20Poly1305;
use ring::rand::{SecureRandom, SystemRandom};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::envelope::{Envelope, EnvelopeError, TAG_SIZE};
use crate::keys::{DerivedKey, Passphrase};

/// AES-256-GCM with the 16-byte IV existing data files use
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// 128-bit nonce for AES-256-GCM envelopes
pub const AES_NONCE_SIZE: usize = 16;
/// 96-bit nonce for ChaCha20-Poly1305 envelopes
pub const CHACHA_NONCE_SIZE: usize = 12;

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed - data may be corrupted, tampered, or sealed under another key")]
    Authentication,

    #[error("Legacy data format")]
    Legacy,

    #[error("Malformed envelope: {0}")]
    Malformed(&'static str),

    #[error("Unsupported nonce size: {0}")]
    UnsupportedNonce(usize),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<EnvelopeError> for CipherError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Legacy => CipherError::Legacy,
            EnvelopeError::Malformed(reason) => CipherError::Malformed(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

impl Algorithm {
    pub fn nonce_size(self) -> usize {
        match self {
            Algorithm::Aes256Gcm => AES_NONCE_SIZE,
            Algorithm::ChaCha20Poly1305 => CHACHA_NONCE_SIZE,
        }
    }

    fn for_nonce(len: usize) -> Result<Self, CipherError> {
        match len {
            AES_NONCE_SIZE => Ok(Algorithm::Aes256Gcm),
            CHACHA_NONCE_SIZE => Ok(Algorithm::ChaCha20Poly1305),
            other => Err(CipherError::UnsupportedNonce(other)),
        }
    }
}

/// Seals and opens documents under one derived key.
///
/// Built once at startup and shared by reference; there is no global key.
pub struct Cipher {
    key: DerivedKey,
    algorithm: Algorithm,
    rng: SystemRandom,
}

impl Cipher {
    pub fn new(passphrase: &Passphrase, algorithm: Algorithm) -> Self {
        Self::from_key(DerivedKey::derive(passphrase), algorithm)
    }

    pub fn from_key(key: DerivedKey, algorithm: Algorithm) -> Self {
        Self {
            key,
            algorithm,
            rng: SystemRandom::new(),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn fingerprint(&self) -> String {
        self.key.fingerprint()
    }

    /// Serialize `value` and seal it into an envelope string.
    pub fn seal<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CipherError> {
        let mut buffer = serde_json::to_vec(value)?;

        let mut nonce = vec![0u8; self.algorithm.nonce_size()];
        self.rng
            .fill(&mut nonce)
            .map_err(|_| CipherError::EncryptionFailed)?;

        let tag = self.seal_in_place(self.algorithm, &nonce, &mut buffer)?;
        Ok(Envelope::new(nonce, tag, buffer).encode())
    }

    /// Verify and decrypt an envelope back into JSON.
    pub fn open(&self, text: &str) -> Result<Value, CipherError> {
        let envelope = Envelope::parse(text)?;
        let algorithm = Algorithm::for_nonce(envelope.nonce.len())?;

        let mut buffer = Zeroizing::new(envelope.ciphertext);
        self.open_in_place(algorithm, &envelope.nonce, &mut buffer, &envelope.tag)?;

        Ok(serde_json::from_slice(&buffer)?)
    }

    pub fn open_as<T: DeserializeOwned>(&self, text: &str) -> Result<T, CipherError> {
        Ok(serde_json::from_value(self.open(text)?)?)
    }

    /// Returns `None` instead of an error; the failure is logged.
    pub fn encrypt<T: Serialize + ?Sized>(&self, value: &T) -> Option<String> {
        match self.seal(value) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                tracing::error!(error = %e, "encryption error");
                None
            }
        }
    }

    /// Returns `None` for anything that does not open cleanly. Legacy
    /// data is abandoned and gets re-encrypted on the next save.
    pub fn decrypt(&self, text: &str) -> Option<Value> {
        match self.open(text) {
            Ok(value) => Some(value),
            Err(CipherError::Legacy) => {
                tracing::info!("legacy encrypted data detected - will be migrated on next save");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "decryption error");
                None
            }
        }
    }

    fn seal_in_place(
        &self,
        algorithm: Algorithm,
        nonce: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<[u8; TAG_SIZE], CipherError> {
        let key = self.key.as_bytes();
        let tag = match algorithm {
            Algorithm::Aes256Gcm => Aes256Gcm16::new_from_slice(key)
                .map_err(|_| CipherError::EncryptionFailed)?
                .encrypt_in_place_detached(GenericArray::from_slice(nonce), b"", buffer),
            Algorithm::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key)
                .map_err(|_| CipherError::EncryptionFailed)?
                .encrypt_in_place_detached(GenericArray::from_slice(nonce), b"", buffer),
        }
        .map_err(|_| CipherError::EncryptionFailed)?;

        let mut out = [0u8; TAG_SIZE];
        out.copy_from_slice(tag.as_slice());
        Ok(out)
    }

    fn open_in_place(
        &self,
        algorithm: Algorithm,
        nonce: &[u8],
        buffer: &mut Vec<u8>,
        tag: &[u8; TAG_SIZE],
    ) -> Result<(), CipherError> {
        let key = self.key.as_bytes();
        let tag = GenericArray::from_slice(tag);
        match algorithm {
            Algorithm::Aes256Gcm => Aes256Gcm16::new_from_slice(key)
                .map_err(|_| CipherError::Authentication)?
                .decrypt_in_place_detached(GenericArray::from_slice(nonce), b"", buffer, tag),
            Algorithm::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key)
                .map_err(|_| CipherError::Authentication)?
                .decrypt_in_place_detached(GenericArray::from_slice(nonce), b"", buffer, tag),
        }
        .map_err(|_| CipherError::Authentication)
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher")
            .field("key", &self.key)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}
