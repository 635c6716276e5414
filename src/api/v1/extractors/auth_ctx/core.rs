/*
 * Responsibility
 * - Turn the SecurityContext left by the bearer middleware into a handler argument
 * - Anonymous (or no context at all) → 401; missing role → 403
 */
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::services::auth::{Principal, SecurityContext};

/// The authenticated caller. Taking it as an argument makes the route require a user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl CurrentUser {
    pub fn require_role(&self, role: &str) -> Result<(), AppError> {
        if self.0.has_role(role) {
            Ok(())
        } else {
            tracing::warn!(username = %self.0.username(), role, "missing required role");
            Err(AppError::Forbidden)
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A route mounted outside the bearer layer has no context: treat it as anonymous.
        match parts.extensions.get::<SecurityContext>() {
            Some(SecurityContext::Authenticated(principal)) => Ok(Self(principal.clone())),
            Some(SecurityContext::Anonymous) | None => Err(AppError::Unauthorized),
        }
    }
}
