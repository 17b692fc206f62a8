//! Row models for the directory tables.

mod connection;
mod user;

pub use connection::{NewProviderConnection, ProviderConnection};
pub use user::{NewUser, User};
