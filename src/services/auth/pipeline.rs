//! Bearer-token authentication pipeline.
//!
//! Turns the `Authorization` header of one request into a `SecurityContext`.
//! Every failure path ends in `Anonymous`: rejecting the request is left to
//! whichever handler later demands an authenticated user or a role.
use std::sync::Arc;

use axum::http::HeaderValue;
use tracing::{debug, error, warn};

use crate::services::auth::context::{Principal, RequestDetails, SecurityContext};
use crate::services::auth::identity::IdentityLookup;
use crate::services::auth::token_service::TokenService;

pub const BEARER_PREFIX: &str = "Bearer ";

#[derive(Clone)]
pub struct AuthenticationPipeline {
    tokens: Arc<TokenService>,
    identities: Arc<dyn IdentityLookup>,
}

impl AuthenticationPipeline {
    pub fn new(tokens: Arc<TokenService>, identities: Arc<dyn IdentityLookup>) -> Self {
        Self { tokens, identities }
    }

    pub async fn authenticate(
        &self,
        authorization: Option<&HeaderValue>,
        details: RequestDetails,
    ) -> SecurityContext {
        let Some(token) = bearer_token(authorization) else {
            return SecurityContext::Anonymous;
        };

        if !self.tokens.is_valid(token) {
            return SecurityContext::Anonymous;
        }

        // Expiry can cross between the check above and this parse.
        let claims = match self.tokens.parse(token) {
            Ok(claims) => claims,
            Err(err) => {
                debug!(error = %err, "token became unusable after validation");
                return SecurityContext::Anonymous;
            }
        };

        match self.identities.by_username(&claims.subject).await {
            Ok(Some(identity)) => {
                debug!(
                    subject = %identity.subject,
                    request_id = ?details.request_id,
                    "request authenticated"
                );
                SecurityContext::Authenticated(Principal::new(identity, token, details))
            }
            Ok(None) => {
                warn!(subject = %claims.subject, "token subject no longer resolves to a user");
                SecurityContext::Anonymous
            }
            Err(err) => {
                error!(subject = %claims.subject, error = %err, "identity lookup failed");
                SecurityContext::Anonymous
            }
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// Returns `None` for a missing header, a non-ASCII value, another scheme, or an
/// empty token.
pub fn bearer_token(authorization: Option<&HeaderValue>) -> Option<&str> {
    authorization?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .filter(|t| !t.is_empty())
}
