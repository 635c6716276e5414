use std::sync::Arc;

use tracing::debug;

use crate::services::auth::error::AuthError;
use crate::services::auth::identity::{CredentialStore, Identity, IdentityLookup};
use crate::services::auth::token_service::{IssuedToken, TokenService};

/// Result of a successful interactive login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: IssuedToken,
    pub identity: Identity,
}

/// Username/password login: check credentials, load the identity, mint a token.
///
/// Errors propagate to the caller. `UserNotFound` means the store accepted the
/// credentials and then lost the user, which callers should log as an anomaly.
#[derive(Clone)]
pub struct CredentialAuthenticator {
    credentials: Arc<dyn CredentialStore>,
    identities: Arc<dyn IdentityLookup>,
    tokens: Arc<TokenService>,
}

impl CredentialAuthenticator {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        identities: Arc<dyn IdentityLookup>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            credentials,
            identities,
            tokens,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let accepted = self
            .credentials
            .verify(username, password)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        if !accepted {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = self
            .identities
            .by_username(username)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        let token = self.tokens.issue(&identity)?;
        debug!(username = %username, "user logged in");

        Ok(LoginOutcome { token, identity })
    }
}
