use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::BootstrapAdmin;
use crate::error::AppError;
use crate::repos::error::RepoError;
use crate::repos::user_repo::{ADMIN_ROLE, DEFAULT_ROLE, NewUser, UserRecord, UserRepository};
use crate::services::password;

/// Registration and user queries behind the `/auth/register` and `/users` routes.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<UserRecord, AppError> {
        if self.repo.exists_by_username(username).await? {
            warn!(username = %username, "username already exists");
            return Err(username_taken());
        }
        if self.repo.exists_by_email(email).await? {
            warn!(email = %email, "email already exists");
            return Err(email_taken());
        }

        let password_hash = password::hash(password).await.map_err(|e| {
            error!(error = %e, "password hashing failed");
            AppError::Internal
        })?;

        let user = self
            .repo
            .create(
                NewUser {
                    username: username.to_string(),
                    email: email.to_string(),
                    password_hash,
                },
                DEFAULT_ROLE,
            )
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration.
                RepoError::Conflict => username_taken(),
                RepoError::RoleNotFound(role) => {
                    error!(role = %role, "default role not found");
                    AppError::Internal
                }
                other => other.into(),
            })?;

        info!(username = %user.username, "user registered");
        Ok(user)
    }

    /// Make sure the configured administrator exists and holds `ADMIN_ROLE`.
    ///
    /// An existing account keeps its password; only the role is (re)granted.
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> Result<(), AppError> {
        if !self.repo.exists_by_username(&admin.username).await? {
            self.register(&admin.username, &admin.password, &admin.email)
                .await?;
        }
        self.repo.grant_role(&admin.username, ADMIN_ROLE).await?;

        info!(username = %admin.username, "bootstrap admin ready");
        Ok(())
    }

    pub async fn by_id(&self, id: i64) -> Result<UserRecord, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(AppError::user_not_found)
    }
}

fn username_taken() -> AppError {
    AppError::conflict("USERNAME_ALREADY_EXISTS", "username already exists")
}

fn email_taken() -> AppError {
    AppError::conflict("EMAIL_ALREADY_EXISTS", "email already exists")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::memory::InMemoryUserStore;

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryUserStore::with_roles([DEFAULT_ROLE])))
    }

    #[tokio::test]
    async fn register_hashes_password_and_assigns_default_role() {
        let users = service();
        let user = users
            .register("alice", "correct-password", "alice@example.com")
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert!(user.roles.contains(DEFAULT_ROLE));
        assert_ne!(user.password_hash, "correct-password");
        assert!(password::verify("correct-password", &user.password_hash)
                .await
                .unwrap());
        assert_eq!(users.by_id(user.id).await.unwrap(), user);
    }

    #[tokio::test]
    async fn duplicates_are_rejected_with_distinct_codes() {
        let users = service();
        users
            .register("alice", "correct-password", "alice@example.com")
            .await
            .unwrap();

        let err = users
            .register("alice", "another-pw", "other@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { code: "USERNAME_ALREADY_EXISTS", .. }));

        let err = users
            .register("alice2", "another-pw", "alice@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { code: "EMAIL_ALREADY_EXISTS", .. }));
    }

    #[tokio::test]
    async fn missing_default_role_is_internal() {
        let users = UserService::new(Arc::new(InMemoryUserStore::with_roles(["ROLE_ADMIN"])));
        let err = users
            .register("alice", "correct-password", "alice@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal));
    }

    #[tokio::test]
    async fn ensure_admin_creates_once_and_grants_role() {
        let users = UserService::new(Arc::new(InMemoryUserStore::with_roles([
            DEFAULT_ROLE,
            ADMIN_ROLE,
        ])));
        let admin = BootstrapAdmin {
            username: "root".into(),
            password: "root-password".into(),
            email: "root@example.com".into(),
        };

        users.ensure_admin(&admin).await.unwrap();
        users.ensure_admin(&admin).await.unwrap();

        let user = users.by_id(1).await.unwrap();
        assert_eq!(user.username, "root");
        assert!(user.roles.contains(ADMIN_ROLE));
        assert!(user.roles.contains(DEFAULT_ROLE));
        assert!(users.by_id(2).await.is_err());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let err = service().by_id(99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { code: "USER_NOT_FOUND", .. }));
    }
}
