//! Provider connection queries.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::{NewProviderConnection, ProviderConnection};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

diesel::define_sql_function! {
    /// SQL `lower(text)`.
    fn lower(value: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

/// Repository for provider connection rows.
pub trait ConnectionRepository {
    /// Creates a connection.
    fn create_connection(
        &mut self,
        new_connection: NewProviderConnection,
    ) -> impl Future<Output = PgResult<ProviderConnection>> + Send;

    /// Lists the non-deleted connections of one provider, oldest first.
    ///
    /// `provider` is matched case-insensitively against the stored name.
    fn find_active_connections_by_provider(
        &mut self,
        provider: &str,
    ) -> impl Future<Output = PgResult<Vec<ProviderConnection>>> + Send;

    /// Soft-deletes a connection. Returns whether a row was affected.
    fn delete_connection(&mut self, connection_id: i64)
    -> impl Future<Output = PgResult<bool>> + Send;
}

impl ConnectionRepository for PgConnection {
    async fn create_connection(
        &mut self,
        new_connection: NewProviderConnection,
    ) -> PgResult<ProviderConnection> {
        use schema::connections;

        diesel::insert_into(connections::table)
            .values(&new_connection)
            .returning(ProviderConnection::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_active_connections_by_provider(
        &mut self,
        provider: &str,
    ) -> PgResult<Vec<ProviderConnection>> {
        use schema::connections::{self, dsl};

        let rows = connections::table
            .filter(lower(dsl::provider).eq(provider.to_ascii_lowercase()))
            .filter(dsl::deleted_at.is_null())
            .order(dsl::id.asc())
            .select(ProviderConnection::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            provider,
            count = rows.len(),
            "Loaded active connections"
        );

        Ok(rows)
    }

    async fn delete_connection(&mut self, connection_id: i64) -> PgResult<bool> {
        use diesel::dsl::now;
        use schema::connections::{self, dsl};

        let affected = diesel::update(
            connections::table
                .filter(dsl::id.eq(connection_id))
                .filter(dsl::deleted_at.is_null()),
        )
        .set(dsl::deleted_at.eq(now))
        .execute(self)
        .await
        .map_err(PgError::from)?;

        Ok(affected > 0)
    }
}
