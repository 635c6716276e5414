/*
 * Responsibility
 * - What a repo failure means to the layers above
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("conflict")]
    Conflict,
    #[error("role not found: {0}")]
    RoleNotFound(String),
}

impl RepoError {
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        // 23505 = unique_violation
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some("23505")
        {
            return RepoError::Conflict;
        }
        RepoError::Db(e)
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
