//! Haven Crypto - authenticated encryption for stored documents
//!
//! This crate provides:
//! - Passphrase handling and SHA-256 key derivation
//! - The `nonce:tag:ciphertext` hex text envelope
//! - AES-256-GCM / ChaCha20-Poly1305 sealing of JSON values

pub mod cipher;
pub mod envelope;
pub mod keys;

pub use cipher::{Algorithm, Cipher, CipherError};
pub use envelope::{Envelope, EnvelopeError};
pub use keys::{DerivedKey, KeyError, Passphrase};
