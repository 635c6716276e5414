/*
 * Responsibility
 * - v1 URL layout
 * - Every route sits behind the bearer layer; handlers that need a user take CurrentUser
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    auth::{login, register},
    users::{get_user, me},
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/users/me", get(me))
        .route("/users/{user_id}", get(get_user))
}
