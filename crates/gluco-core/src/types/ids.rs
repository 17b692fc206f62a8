use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Identity of a stored provider connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Display, From, Into, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(i64);

impl ConnectionId {
    /// Creates a new connection id.
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw database identifier.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

/// Identity of the user a connection (and every reading it yields) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Display, From, Into, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a new user id.
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw database identifier.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}
