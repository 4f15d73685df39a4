//! services/api/src/web/user.rs
//!
//! Registration and login endpoints.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::dto::{LoginRequest, RegisterRequest, ResultResponse, TokenResponse};
use crate::web::extract::ValidJson;
use crate::web::state::AppState;

/// POST /user/register - Create a new user account
#[utoipa::path(
    post,
    path = "/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = ResultResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Username already exists")
    ),
    tag = "user"
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(registration): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ResultResponse>), ApiError> {
    state.identity.register(registration).await?;
    Ok((StatusCode::CREATED, Json(ResultResponse::success())))
}

/// POST /user/login - Exchange credentials for a bearer token valid for three hours
#[utoipa::path(
    post,
    path = "/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "User not found")
    ),
    tag = "user"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(credentials): ValidJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let issued = state
        .identity
        .login(&credentials.username, &credentials.password)
        .await?;
    Ok(Json(TokenResponse { token: issued.token }))
}
