//! XChaCha20-Poly1305 encryption and decryption.
//!
//! # Wire Format
//!
//! The ciphertext format is: `nonce (24 bytes) || ciphertext || tag (16 bytes)`
//!
//! - **Nonce**: 24-byte random value, safe to generate randomly without collision risk
//! - **Ciphertext**: Same length as plaintext
//! - **Tag**: 16-byte authentication tag appended by the cipher

use chacha20poly1305::XChaCha20Poly1305;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};

use super::error::{CryptoError, CryptoResult};
use super::key::EncryptionKey;

/// Size of the XChaCha20-Poly1305 nonce in bytes.
pub const NONCE_SIZE: usize = 24;

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Minimum size of valid ciphertext (nonce + tag, no plaintext).
pub const MIN_CIPHERTEXT_SIZE: usize = NONCE_SIZE + TAG_SIZE;

/// Encrypts plaintext using XChaCha20-Poly1305.
///
/// Returns `nonce (24 bytes) || ciphertext || tag (16 bytes)`.
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce);
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// Decrypts ciphertext produced by [`encrypt`].
///
/// # Errors
///
/// - [`CryptoError::CiphertextTooShort`] if the input is shorter than nonce + tag
/// - [`CryptoError::DecryptionFailed`] on a wrong key, corruption or tampering
pub fn decrypt(key: &EncryptionKey, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    if ciphertext.len() < MIN_CIPHERTEXT_SIZE {
        return Err(CryptoError::CiphertextTooShort);
    }

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let (nonce_bytes, encrypted) = ciphertext.split_at(NONCE_SIZE);

    cipher
        .decrypt(nonce_bytes.into(), encrypted)
        .map_err(|_| CryptoError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = EncryptionKey::generate();
        let plaintext = b"correct horse battery staple";

        let ciphertext = encrypt(&key, plaintext).unwrap();
        let decrypted = decrypt(&key, &ciphertext).unwrap();

        assert_eq!(plaintext, decrypted.as_slice());
    }

    #[test]
    fn test_ciphertext_size() {
        let key = EncryptionKey::generate();
        let plaintext = b"test";

        let ciphertext = encrypt(&key, plaintext).unwrap();
        assert_eq!(ciphertext.len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let key1 = EncryptionKey::generate();
        let key2 = EncryptionKey::generate();

        let ciphertext = encrypt(&key1, b"secret data").unwrap();
        let result = decrypt(&key2, &ciphertext);

        assert!(matches!(result, Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn test_decrypt_corrupted_data() {
        let key = EncryptionKey::generate();

        let mut ciphertext = encrypt(&key, b"secret data").unwrap();
        ciphertext[NONCE_SIZE + 2] ^= 0xFF;

        let result = decrypt(&key, &ciphertext);
        assert!(matches!(result, Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn test_decrypt_truncated_data() {
        let key = EncryptionKey::generate();

        let short = vec![0u8; MIN_CIPHERTEXT_SIZE - 1];
        let result = decrypt(&key, &short);

        assert!(matches!(result, Err(CryptoError::CiphertextTooShort)));
    }

    #[test]
    fn test_nonces_differ() {
        let key = EncryptionKey::generate();

        let ciphertext1 = encrypt(&key, b"same data").unwrap();
        let ciphertext2 = encrypt(&key, b"same data").unwrap();

        assert_ne!(ciphertext1, ciphertext2);
    }
}
