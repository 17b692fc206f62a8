//! Repository traits implemented on [`PgConnection`](crate::PgConnection).

mod connection;
mod user;

pub use connection::ConnectionRepository;
pub use user::UserRepository;
