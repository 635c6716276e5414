/*
 * Responsibility
 * - POST /auth/login, POST /auth/register
 * - Validate the DTO, call the service, shape the response
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::{error, warn};

use crate::api::v1::dto::auth::{LoginRequest, LoginResponse, RegisterRequest};
use crate::api::v1::dto::users::UserInfo;
use crate::error::AppError;
use crate::services::auth::AuthError;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let outcome = state
        .authenticator
        .login(&req.username, &req.password)
        .await
        .inspect_err(|e| match e {
            AuthError::InvalidCredentials => {
                warn!(username = %req.username, "login rejected: invalid credentials")
            }
            AuthError::UserNotFound => {
                error!(username = %req.username, "login rejected: credentials accepted but user is gone")
            }
            _ => {}
        })?;

    let expires_in = outcome.token.expires_in();
    Ok(Json(LoginResponse {
        token: outcome.token.token,
        token_type: "Bearer",
        expires_in,
        user: outcome.identity.into(),
    }))
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserInfo>), AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let user = state
        .users
        .register(&req.username, &req.password, req.email.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}
