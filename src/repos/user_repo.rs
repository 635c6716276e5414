/*
 * Responsibility
 * - users / roles / user_roles access through sqlx (PgPool)
 * - UserRepository: the persistence seam shared by Postgres and in-memory stores
 * - Every UserRepository also serves as the auth core's IdentityLookup and CredentialStore
 */
use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::warn;

use crate::repos::error::{RepoError, RepoResult};
use crate::services::auth::{CredentialStore, Identity, IdentityLookup, StoreError};
use crate::services::password::{self, PasswordError};

/// Role attached to every newly registered user.
pub const DEFAULT_ROLE: &str = "ROLE_USER";
pub const ADMIN_ROLE: &str = "ROLE_ADMIN";

#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub enabled: bool,
    pub roles: BTreeSet<String>,
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            subject: self.username.clone(),
            email: self.email.clone(),
            roles: self.roles.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRecord>>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<UserRecord>>;

    async fn exists_by_username(&self, username: &str) -> RepoResult<bool>;

    async fn exists_by_email(&self, email: &str) -> RepoResult<bool>;

    /// Insert `user` and attach `role`.
    ///
    /// Fails with `RoleNotFound` (nothing inserted) when `role` does not exist and
    /// with `Conflict` when username or email is already taken.
    async fn create(&self, user: NewUser, role: &str) -> RepoResult<UserRecord>;

    /// Attach `role` to an existing user. Unknown users are ignored.
    async fn grant_role(&self, username: &str, role: &str) -> RepoResult<()>;
}

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn roles_of(&self, user_id: i64) -> RepoResult<BTreeSet<String>> {
        let roles = sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles.into_iter().collect())
    }

    async fn with_roles(&self, row: Option<UserRow>) -> RepoResult<Option<UserRecord>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let roles = self.roles_of(row.id).await?;
        Ok(Some(into_record(row, roles)))
    }
}

fn into_record(row: UserRow, roles: BTreeSet<String>) -> UserRecord {
    UserRecord {
        id: row.id,
        username: row.username,
        email: row.email,
        password_hash: row.password_hash,
        enabled: row.enabled,
        roles,
    }
}

#[async_trait]
impl UserRepository for PgUserRepo {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, enabled
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        self.with_roles(row).await
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, enabled
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.with_roles(row).await
    }

    async fn exists_by_username(&self, username: &str) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn create(&self, user: NewUser, role: &str) -> RepoResult<UserRecord> {
        let mut tx = self.pool.begin().await?;

        let role_id = sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = $1")
            .bind(role)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepoError::RoleNotFound(role.to_string()))?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, enabled
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepoError::from_sqlx)?;

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(row.id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(into_record(row, BTreeSet::from([role.to_string()])))
    }

    async fn grant_role(&self, username: &str, role: &str) -> RepoResult<()> {
        let role_id = sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = $1")
            .bind(role)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::RoleNotFound(role.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT id, $2 FROM users WHERE username = $1
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(username)
        .bind(role_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn store_error(e: RepoError) -> StoreError {
    StoreError(e.to_string())
}

#[async_trait]
impl<R: UserRepository> IdentityLookup for R {
    async fn by_username(&self, subject: &str) -> Result<Option<Identity>, StoreError> {
        let user = self.find_by_username(subject).await.map_err(store_error)?;
        Ok(user.filter(|u| u.enabled).map(|u| u.identity()))
    }
}

#[async_trait]
impl<R: UserRepository> CredentialStore for R {
    async fn verify(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        let Some(user) = self.find_by_username(username).await.map_err(store_error)? else {
            // Spend comparable time for unknown users so timing does not reveal them.
            let _ = password::hash(password).await;
            return Ok(false);
        };

        match password::verify(password, &user.password_hash).await {
            Ok(matched) => Ok(matched && user.enabled),
            Err(e @ PasswordError::Task(_)) => Err(StoreError(e.to_string())),
            Err(e) => {
                warn!(username = %username, error = %e, "rejecting login against unreadable hash");
                Ok(false)
            }
        }
    }
}
