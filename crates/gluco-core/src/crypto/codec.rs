//! Opening stored connection credentials.

use std::fmt;

use super::cipher::{decrypt, encrypt};
use super::error::{CryptoError, CryptoResult};
use super::key::EncryptionKey;
use crate::types::{ConnectionRecord, ProviderCredential};

/// Decrypts the sealed password of a [`ConnectionRecord`] into a usable credential.
///
/// The codec never stores what it opens; the returned [`ProviderCredential`] is
/// handed straight to the session being built.
#[derive(Clone)]
pub struct CredentialCodec {
    key: EncryptionKey,
}

impl CredentialCodec {
    /// Creates a codec for the given key.
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Seals a plaintext password for storage.
    pub fn encrypt(&self, password: &str) -> CryptoResult<Vec<u8>> {
        encrypt(&self.key, password.as_bytes())
    }

    /// Opens a sealed password.
    pub fn decrypt(&self, encrypted: &[u8]) -> CryptoResult<String> {
        let plaintext = decrypt(&self.key, encrypted)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }

    /// Opens the credential stored with a connection record.
    pub fn open(&self, record: &ConnectionRecord) -> CryptoResult<ProviderCredential> {
        let password = self.decrypt(&record.encrypted_credential)?;
        Ok(ProviderCredential::new(record.username.clone(), password))
    }
}

impl fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCodec")
            .field("key", &self.key)
            .finish()
    }
}
