//! Cryptographic error types.

use thiserror::Error;

use crate::{Error as CoreError, ErrorKind};

/// Result type for cryptographic operations.
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The ciphertext is too short to contain a valid nonce and tag.
    #[error("ciphertext too short to contain nonce and authentication tag")]
    CiphertextTooShort,
    /// Decryption failed - data may be corrupted, tampered with, or sealed under another key.
    #[error("decryption failed: data may be corrupted or sealed under another key")]
    DecryptionFailed,
    /// Encryption failed.
    #[error("encryption failed")]
    EncryptionFailed,
    /// The provided key has an invalid length.
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    /// The provided key is not valid base64.
    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(String),
    /// The decrypted secret is not valid UTF-8.
    #[error("decrypted credential is not valid UTF-8")]
    InvalidUtf8,
}

impl From<CryptoError> for CoreError {
    fn from(error: CryptoError) -> Self {
        let kind = match error {
            CryptoError::InvalidKeyLength(_) | CryptoError::InvalidKeyEncoding(_) => {
                ErrorKind::Configuration
            }
            _ => ErrorKind::Credential,
        };

        Self::from_source(kind, error)
    }
}
