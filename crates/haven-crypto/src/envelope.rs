//! Text envelope for encrypted documents
//!
//! Format: `<nonce hex>:<tag hex>:<ciphertext hex>`, lower-case hex.
//! The nonce length identifies the cipher that produced the envelope.

use thiserror::Error;

/// AEAD authentication tag length (both supported ciphers)
pub const TAG_SIZE: usize = 16;

const SEPARATOR: char = ':';

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Not an envelope (legacy format)")]
    Legacy,

    #[error("Malformed envelope: {0}")]
    Malformed(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub nonce: Vec<u8>,
    pub tag: [u8; TAG_SIZE],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    pub fn new(nonce: Vec<u8>, tag: [u8; TAG_SIZE], ciphertext: Vec<u8>) -> Self {
        Self { nonce, tag, ciphertext }
    }

    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(
            (self.nonce.len() + TAG_SIZE + self.ciphertext.len()) * 2 + 2,
        );
        out.push_str(&hex::encode(&self.nonce));
        out.push(SEPARATOR);
        out.push_str(&hex::encode(self.tag));
        out.push(SEPARATOR);
        out.push_str(&hex::encode(&self.ciphertext));
        out
    }

    /// Parse an envelope. Nonce length is checked against the supported
    /// ciphers by the caller.
    pub fn parse(text: &str) -> Result<Self, EnvelopeError> {
        let text = text.trim();
        if !text.contains(SEPARATOR) {
            return Err(EnvelopeError::Legacy);
        }

        let mut parts = text.split(SEPARATOR);
        let (nonce, tag, ciphertext) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(n), Some(t), Some(c), None) => (n, t, c),
            _ => return Err(EnvelopeError::Malformed("expected three fields")),
        };

        let nonce = hex::decode(nonce).map_err(|_| EnvelopeError::Malformed("nonce is not hex"))?;
        if nonce.is_empty() {
            return Err(EnvelopeError::Malformed("empty nonce"));
        }

        let tag_bytes = hex::decode(tag).map_err(|_| EnvelopeError::Malformed("tag is not hex"))?;
        let tag: [u8; TAG_SIZE] = tag_bytes
            .try_into()
            .map_err(|_| EnvelopeError::Malformed("tag has wrong length"))?;

        let ciphertext =
            hex::decode(ciphertext).map_err(|_| EnvelopeError::Malformed("ciphertext is not hex"))?;

        Ok(Self { nonce, tag, ciphertext })
    }
}
