//! services/api/src/web/middleware.rs
//!
//! The guard pipeline: `require_auth` runs on every protected route and
//! `require_manager` after it on the catalog writes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use cinema_core::access::bearer_token;
use cinema_core::domain::Claims;
use cinema_core::ServiceError;
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Validates the bearer token and stores its `Claims` in the request extensions.
///
/// A missing, malformed, forged or expired token yields 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);

    let claims = state.gate.authenticate(token)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Lets only managers through; must be layered inside `require_auth`.
pub async fn require_manager(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| ServiceError::unauthorized("Missing bearer token"))?;
    state.gate.authorize_manager(claims)?;

    Ok(next.run(req).await)
}
