//! Connection record fixtures.

use gluco_core::crypto::{CredentialCodec, EncryptionKey};
use gluco_core::types::{ConnectionId, ConnectionRecord, ProviderType, Region, UserId};

/// Builds connection records sealed under one shared key.
#[derive(Debug, Clone)]
pub struct Fixtures {
    codec: CredentialCodec,
}

impl Fixtures {
    /// Creates fixtures with a freshly generated key.
    pub fn new() -> Self {
        Self {
            codec: CredentialCodec::new(EncryptionKey::generate()),
        }
    }

    /// Codec able to open every record these fixtures produce.
    pub fn codec(&self) -> CredentialCodec {
        self.codec.clone()
    }

    /// Record `id` owned by `user_id`, password `password-{id}`.
    pub fn connection(&self, id: i64, user_id: i64, provider_type: ProviderType) -> ConnectionRecord {
        let password = format!("password-{id}");
        self.connection_with_secret(id, user_id, provider_type, &password)
    }

    /// Record `id` owned by `user_id` with an explicit password.
    pub fn connection_with_secret(
        &self,
        id: i64,
        user_id: i64,
        provider_type: ProviderType,
        password: &str,
    ) -> ConnectionRecord {
        let encrypted_credential = self
            .codec
            .encrypt(password)
            .unwrap_or_else(|error| panic!("fixture encryption failed: {error}"));

        ConnectionRecord {
            id: ConnectionId::new(id),
            user_id: UserId::new(user_id),
            provider_type,
            region: Region::default(),
            username: format!("user-{id}@example.com"),
            encrypted_credential,
        }
    }

    /// Record whose credential was sealed under a different key.
    pub fn undecryptable(&self, id: i64, user_id: i64, provider_type: ProviderType) -> ConnectionRecord {
        Fixtures::new().connection(id, user_id, provider_type)
    }
}

impl Default for Fixtures {
    fn default() -> Self {
        Self::new()
    }
}
