//! In-process user store.
//!
//! Backs `USER_STORE=memory` for local runs and the test suite. Data is lost on
//! restart.
use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_repo::{NewUser, UserRecord, UserRepository};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<String, UserRecord>,
    roles: BTreeSet<String>,
    next_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    /// Store seeded with the given role names.
    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: RwLock::new(Inner {
                users: HashMap::new(),
                roles: roles.into_iter().map(Into::into).collect(),
                next_id: 1,
            }),
        }
    }

    #[cfg(test)]
    pub async fn remove(&self, username: &str) {
        self.inner.write().await.users.remove(username);
    }

    #[cfg(test)]
    pub async fn set_enabled(&self, username: &str, enabled: bool) {
        if let Some(user) = self.inner.write().await.users.get_mut(username) {
            user.enabled = enabled;
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRecord>> {
        Ok(self.inner.read().await.users.get(username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<UserRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> RepoResult<bool> {
        Ok(self.inner.read().await.users.contains_key(username))
    }

    async fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .any(|u| u.email == email))
    }

    async fn create(&self, user: NewUser, role: &str) -> RepoResult<UserRecord> {
        let mut inner = self.inner.write().await;

        if !inner.roles.contains(role) {
            return Err(RepoError::RoleNotFound(role.to_string()));
        }
        if inner.users.contains_key(&user.username)
            || inner.users.values().any(|u| u.email == user.email)
        {
            return Err(RepoError::Conflict);
        }

        let record = UserRecord {
            id: inner.next_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            enabled: true,
            roles: BTreeSet::from([role.to_string()]),
        };
        inner.next_id += 1;
        inner.users.insert(record.username.clone(), record.clone());

        Ok(record)
    }
    async fn grant_role(&self, username: &str, role: &str) -> RepoResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.roles.contains(role) {
            return Err(RepoError::RoleNotFound(role.to_string()));
        }
        if let Some(user) = inner.users.get_mut(username) {
            user.roles.insert(role.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::user_repo::DEFAULT_ROLE;
    use crate::services::auth::{CredentialStore, IdentityLookup};
    use crate::services::password;

    async fn store_with_alice() -> InMemoryUserStore {
        let store = InMemoryUserStore::with_roles([DEFAULT_ROLE, "ROLE_ADMIN"]);
        store
            .create(
                NewUser {
                    username: "alice".into(),
                    email: "alice@example.com".into(),
                    password_hash: password::hash("correct-password").await.unwrap(),
                },
                DEFAULT_ROLE,
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn create_assigns_ids_and_rejects_duplicates() {
        let store = store_with_alice().await;
        let bob = store
            .create(
                NewUser {
                    username: "bob".into(),
                    email: "bob@example.com".into(),
                    password_hash: "x".into(),
                },
                DEFAULT_ROLE,
            )
            .await
            .unwrap();
        assert_eq!(bob.id, 2);
        assert_eq!(store.find_by_id(2).await.unwrap().unwrap().username, "bob");

        let dup = store
            .create(
                NewUser {
                    username: "carol".into(),
                    email: "bob@example.com".into(),
                    password_hash: "x".into(),
                },
                DEFAULT_ROLE,
            )
            .await;
        assert!(matches!(dup, Err(RepoError::Conflict)));
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let store = InMemoryUserStore::with_roles(["ROLE_ADMIN"]);
        let res = store
            .create(
                NewUser {
                    username: "dave".into(),
                    email: "dave@example.com".into(),
                    password_hash: "x".into(),
                },
                DEFAULT_ROLE,
            )
            .await;

        assert!(matches!(res, Err(RepoError::RoleNotFound(r)) if r == DEFAULT_ROLE));
        assert!(!store.exists_by_username("dave").await.unwrap());
    }

    #[tokio::test]
    async fn serves_as_credential_store() {
        let store = store_with_alice().await;

        assert!(store.verify("alice", "correct-password").await.unwrap());
        assert!(!store.verify("alice", "wrong-password").await.unwrap());
        assert!(!store.verify("nobody", "correct-password").await.unwrap());

        store.set_enabled("alice", false).await;
        assert!(!store.verify("alice", "correct-password").await.unwrap());
    }

    #[tokio::test]
    async fn serves_as_identity_lookup() {
        let store = store_with_alice().await;
        store.grant_role("alice", "ROLE_ADMIN").await.unwrap();

        let identity = store.by_username("alice").await.unwrap().unwrap();
        assert_eq!(identity.subject, "alice");
        assert!(identity.has_role("ROLE_ADMIN"));
        assert!(identity.has_role(DEFAULT_ROLE));

        store.set_enabled("alice", false).await;
        assert!(store.by_username("alice").await.unwrap().is_none());

        store.remove("alice").await;
        assert!(store.by_username("alice").await.unwrap().is_none());
    }
}
