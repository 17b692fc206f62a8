use std::fmt;

/// Plaintext login material for a provider account.
///
/// Only ever held by the session built from it. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredential {
    username: String,
    password: String,
}

impl ProviderCredential {
    /// Creates a credential from a username and a decrypted password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the account username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the decrypted password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let credential = ProviderCredential::new("alice@example.com", "hunter2");
        let debug = format!("{credential:?}");
        assert!(debug.contains("alice@example.com"));
        assert!(!debug.contains("hunter2"));
    }
}
