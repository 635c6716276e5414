/*
 * Responsibility
 * - GET /users/me: the caller's own profile
 * - GET /users/{id}: any user, admins only
 */
use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::v1::dto::users::{ProfileResponse, UserResponse};
use crate::api::v1::extractors::CurrentUser;
use crate::error::AppError;
use crate::repos::user_repo::ADMIN_ROLE;
use crate::state::AppState;

pub async fn me(CurrentUser(principal): CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse::from(&principal.identity))
}

pub async fn get_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    user.require_role(ADMIN_ROLE)?;

    let row = state.users.by_id(user_id).await?;
    Ok(Json(row.into()))
}
