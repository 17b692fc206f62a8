use std::fmt;

use super::{ConnectionId, ProviderType, Region, UserId};

/// A provider connection as stored in the directory.
///
/// Read-only from the engine's point of view. The password stays sealed until a
/// session is built from the record.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    /// Directory identity of the connection.
    pub id: ConnectionId,
    /// Owner of the connection.
    pub user_id: UserId,
    /// Provider the credential belongs to.
    pub provider_type: ProviderType,
    /// Provider region code.
    pub region: Region,
    /// Provider account username.
    pub username: String,
    /// Sealed password bytes (`nonce || ciphertext || tag`).
    pub encrypted_credential: Vec<u8>,
}

impl fmt::Debug for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRecord")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("provider_type", &self.provider_type)
            .field("region", &self.region)
            .field("username", &self.username)
            .field(
                "encrypted_credential",
                &format_args!("<{} bytes>", self.encrypted_credential.len()),
            )
            .finish()
    }
}
