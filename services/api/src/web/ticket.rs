//! services/api/src/web/ticket.rs

use axum::{extract::State, http::StatusCode, Extension, Json};
use cinema_core::domain::Claims;
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::dto::{ResultResponse, SessionRequest};
use crate::web::extract::ValidJson;
use crate::web::state::AppState;

/// POST /ticket - Book the caller a ticket for a session
#[utoipa::path(
    post,
    path = "/ticket",
    request_body = SessionRequest,
    responses(
        (status = 201, description = "Ticket booked", body = ResultResponse),
        (status = 400, description = "Too young, or the session is over"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Ticket already booked")
    ),
    security(("bearer_auth" = [])),
    tag = "ticket"
)]
pub async fn book_ticket_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ValidJson(session_id): ValidJson<SessionRequest>,
) -> Result<(StatusCode, Json<ResultResponse>), ApiError> {
    state
        .booking
        .issue_ticket(claims.sub, claims.age, session_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ResultResponse::success())))
}
