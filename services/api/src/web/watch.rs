//! services/api/src/web/watch.rs
//!
//! Watching a booked session and reading the caller's watch history.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use cinema_core::domain::Claims;
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::dto::{HistoryQuery, HistoryResponse, SessionRequest, WatchEntryDto};
use crate::web::extract::ValidJson;
use crate::web::state::AppState;

/// POST /watch - Watch a session the caller holds a ticket for
#[utoipa::path(
    post,
    path = "/watch",
    request_body = SessionRequest,
    responses(
        (status = 201, description = "Watch recorded", body = WatchEntryDto),
        (status = 400, description = "Session is not running"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No ticket for this session")
    ),
    security(("bearer_auth" = [])),
    tag = "watch"
)]
pub async fn watch_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ValidJson(session_id): ValidJson<SessionRequest>,
) -> Result<(StatusCode, Json<WatchEntryDto>), ApiError> {
    let entry = state.watch.record_watch(claims.sub, session_id).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// GET /watch/history - The caller's watched movies, most recent first
#[utoipa::path(
    get,
    path = "/watch/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Watch history", body = HistoryResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "watch"
)]
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let pagination = query.pagination().map_err(ApiError::Validation)?;

    let page = state.watch.list_history(claims.sub, pagination).await?;
    Ok(Json(page.into()))
}
