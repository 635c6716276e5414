/*
 * Responsibility
 * - User-facing views of a UserRecord / Identity
 * - password_hash never leaves the service layer
 */
use std::collections::BTreeSet;

use serde::Serialize;

use crate::repos::user_repo::UserRecord;
use crate::services::auth::Identity;

/// Summary returned by login and registration.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub roles: BTreeSet<String>,
}

impl From<Identity> for UserInfo {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.subject,
            email: identity.email,
            roles: identity.roles,
        }
    }
}

impl From<UserRecord> for UserInfo {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            roles: user.roles,
        }
    }
}

/// `/users/me` profile.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<&Identity> for ProfileResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.subject.clone(),
            email: identity.email.clone(),
        }
    }
}

/// Administrative view of any user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub roles: BTreeSet<String>,
    pub enabled: bool,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            roles: user.roles,
            enabled: user.enabled,
        }
    }
}
