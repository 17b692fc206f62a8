//! Sealing of stored provider credentials.
//!
//! Passwords are stored as XChaCha20-Poly1305 ciphertext and opened only while a
//! provider session is being built. The symmetric key comes from process
//! configuration.

mod cipher;
mod codec;
mod error;
mod key;

pub use cipher::{MIN_CIPHERTEXT_SIZE, NONCE_SIZE, TAG_SIZE, decrypt, encrypt};
pub use codec::CredentialCodec;
pub use error::{CryptoError, CryptoResult};
pub use key::{EncryptionKey, KEY_SIZE};
