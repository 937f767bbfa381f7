//! Passphrase handling and key derivation
//!
//! The operator supplies one passphrase per deployment. It is hashed once
//! with SHA-256 into the 32-byte document key, which is wrapped in
//! `Zeroizing<>` so it's scrubbed from memory on drop.

use ring::digest::{digest, SHA256};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

/// 256-bit key (32 bytes)
pub const KEY_SIZE: usize = 32;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Passphrase is empty")]
    EmptyPassphrase,
}

/// Operator-supplied secret. Never printed.
pub struct Passphrase(SecretString);

impl Passphrase {
    pub fn new(raw: impl Into<String>) -> Result<Self, KeyError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(KeyError::EmptyPassphrase);
        }
        Ok(Self(SecretString::new(raw)))
    }

    fn bytes(&self) -> &[u8] {
        self.0.expose_secret().as_bytes()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(**redacted**)")
    }
}

/// The symmetric key every document is sealed under.
pub struct DerivedKey(Zeroizing<[u8; KEY_SIZE]>);

impl DerivedKey {
    /// SHA-256 of the passphrase bytes.
    pub fn derive(passphrase: &Passphrase) -> Self {
        let hashed = digest(&SHA256, passphrase.bytes());
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        key.copy_from_slice(hashed.as_ref());
        Self(key)
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Short, non-reversible identifier for log lines.
    pub fn fingerprint(&self) -> String {
        let hashed = digest(&SHA256, self.0.as_ref());
        hex::encode(&hashed.as_ref()[..8])
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey({})", self.fingerprint())
    }
}
