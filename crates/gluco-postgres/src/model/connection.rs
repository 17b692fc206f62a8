//! Provider connection rows.

use std::str::FromStr;

use diesel::prelude::*;
use gluco_core::types::{ConnectionId, ConnectionRecord, ProviderType, Region, UserId};
use jiff_diesel::Timestamp;

use crate::schema::connections;

/// A stored provider connection.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProviderConnection {
    /// Unique connection identifier.
    pub id: i64,
    /// Owner of the connection.
    pub user_id: i64,
    /// Provider account username.
    pub username: String,
    /// Sealed provider password (`nonce || ciphertext || tag`).
    pub encrypted_credential: Vec<u8>,
    /// Provider type, e.g. `dexcom` or `libre`.
    pub provider: String,
    /// Provider region code; empty for the provider default.
    pub region: String,
    /// Timestamp when the connection was created.
    pub created_at: Timestamp,
    /// Timestamp when the connection was soft-deleted.
    pub deleted_at: Option<Timestamp>,
}

/// Data for creating a provider connection.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewProviderConnection {
    /// Owner of the connection.
    pub user_id: i64,
    /// Provider account username.
    pub username: String,
    /// Sealed provider password.
    pub encrypted_credential: Vec<u8>,
    /// Provider type.
    pub provider: String,
    /// Provider region code.
    pub region: String,
}

impl ProviderConnection {
    /// Returns whether the connection is deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Converts the row into the engine's view of a connection.
    ///
    /// Returns `None` when the stored provider is not one the engine knows.
    pub fn into_record(self) -> Option<ConnectionRecord> {
        let provider_type = ProviderType::from_str(&self.provider).ok()?;

        Some(ConnectionRecord {
            id: ConnectionId::new(self.id),
            user_id: UserId::new(self.user_id),
            provider_type,
            region: Region::new(&self.region),
            username: self.username,
            encrypted_credential: self.encrypted_credential,
        })
    }
}

impl NewProviderConnection {
    /// Creates a connection row for `provider_type`.
    pub fn new(
        user_id: UserId,
        provider_type: ProviderType,
        region: &Region,
        username: impl Into<String>,
        encrypted_credential: Vec<u8>,
    ) -> Self {
        Self {
            user_id: user_id.get(),
            username: username.into(),
            encrypted_credential,
            provider: provider_type.as_ref().to_owned(),
            region: region.as_str().to_owned(),
        }
    }
}
