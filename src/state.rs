/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 * - Cheap to clone: everything inside sits behind Arc and is read-only after startup
 */
use std::sync::Arc;

use crate::repos::user_repo::UserRepository;
use crate::services::auth::{AuthenticationPipeline, CredentialAuthenticator, TokenService};
use crate::services::users::UserService;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AuthenticationPipeline>,
    pub authenticator: Arc<CredentialAuthenticator>,
    pub users: Arc<UserService>,
}

impl AppState {
    /// Wire every service onto one user repository.
    ///
    /// The repository doubles as the identity lookup and credential store.
    pub fn new<R>(repo: Arc<R>, tokens: Arc<TokenService>) -> Self
    where
        R: UserRepository + 'static,
    {
        let pipeline = AuthenticationPipeline::new(tokens.clone(), repo.clone());
        let authenticator = CredentialAuthenticator::new(repo.clone(), repo.clone(), tokens);
        let users = UserService::new(repo);

        Self {
            pipeline: Arc::new(pipeline),
            authenticator: Arc::new(authenticator),
            users: Arc::new(users),
        }
    }
}
