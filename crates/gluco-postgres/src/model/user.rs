use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::users;

/// Account owning provider connections.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    /// Unique user identifier.
    pub id: i64,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Login email, unique.
    pub email: String,
    /// Password hash.
    pub password: String,
    /// Timestamp when the user signed up.
    pub created_at: Timestamp,
}

/// Data for creating a user.
#[derive(Debug, Clone, Default, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
}
