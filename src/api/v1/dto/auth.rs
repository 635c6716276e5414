/*
 * Responsibility
 * - /auth request/response DTOs
 * - validate(): shape checks only; existence and credentials are the services' job
 */
use serde::{Deserialize, Serialize};

use crate::api::v1::dto::users::UserInfo;
use crate::error::AppError;

const USERNAME_LEN: (usize, usize) = (4, 50);
const PASSWORD_LEN: (usize, usize) = (6, 100);
const EMAIL_MAX_LEN: usize = 100;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().is_empty() {
            return Err(AppError::InvalidRequest("username is required".into()));
        }
        if self.password.is_empty() {
            return Err(AppError::InvalidRequest("password is required".into()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        // "alice " would otherwise become a second account that reads as "alice".
        if self.username.trim() != self.username {
            return Err(AppError::InvalidRequest(
                "username must not start or end with whitespace".into(),
            ));
        }
        check_len("username", &self.username, USERNAME_LEN)?;
        check_len("password", &self.password, PASSWORD_LEN)?;

        let email = self.email.trim();
        if email.is_empty() {
            return Err(AppError::InvalidRequest("email is required".into()));
        }
        if !email.contains('@') {
            return Err(AppError::InvalidRequest("email must be a valid address".into()));
        }
        if email.chars().count() > EMAIL_MAX_LEN {
            return Err(AppError::InvalidRequest(format!(
                "email must be at most {EMAIL_MAX_LEN} characters"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

fn check_len(field: &str, value: &str, (min, max): (usize, usize)) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::InvalidRequest(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    /// Seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}
