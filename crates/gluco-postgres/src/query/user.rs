use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::{NewUser, User};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for user rows.
pub trait UserRepository {
    /// Creates a user.
    fn create_user(&mut self, new_user: NewUser) -> impl Future<Output = PgResult<User>> + Send;
}

impl UserRepository for PgConnection {
    async fn create_user(&mut self, new_user: NewUser) -> PgResult<User> {
        use schema::users;

        diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }
}
