use thiserror::Error;

use crate::error::ErrorCategory;

/// Domain errors of the authentication core.
///
/// The first four are caller-correctable and all surface to clients as the same
/// generic 401; logs keep the specific variant.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Credentials matched but the identity record is gone.
    #[error("user not found")]
    UserNotFound,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token")]
    TokenInvalid,

    #[error("token signing failed: {0}")]
    Signing(String),

    /// `now + validity` does not fit in a timestamp.
    #[error("token expiry out of range")]
    ExpiryOutOfRange,

    #[error("user store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AuthError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidCredentials
            | Self::UserNotFound
            | Self::TokenExpired
            | Self::TokenInvalid => ErrorCategory::Business,
            Self::Signing(_) | Self::ExpiryOutOfRange | Self::StoreUnavailable(_) => {
                ErrorCategory::Technical
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert_eq!(AuthError::TokenExpired.category(), ErrorCategory::Business);
        assert_eq!(AuthError::UserNotFound.category(), ErrorCategory::Business);
        assert_eq!(
            AuthError::StoreUnavailable("down".into()).category(),
            ErrorCategory::Technical
        );
    }
}
