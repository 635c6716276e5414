//! Identity model and the two user-store collaborators the auth core consumes.
//!
//! The core never owns user data: it asks `IdentityLookup` who a subject is and
//! asks `CredentialStore` whether a password matches. Adapters live in `repos`.
use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

/// Resolved user, as loaded for one request or one login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    /// Unique username; the token `sub`.
    pub subject: String,
    pub email: String,
    pub roles: BTreeSet<String>,
}

impl Identity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Backend failure of a user-store collaborator (connection lost, bad row, ...).
#[derive(Debug, Error)]
#[error("user store failure: {0}")]
pub struct StoreError(pub String);

#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// `Ok(None)` when no active user has this username.
    async fn by_username(&self, subject: &str) -> Result<Option<Identity>, StoreError>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(false)` for an unknown user, a disabled user or a wrong password.
    ///
    /// Implementations own the password comparison and must keep it constant-time.
    async fn verify(&self, username: &str, password: &str) -> Result<bool, StoreError>;
}
