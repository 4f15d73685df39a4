//! services/api/src/web/movie.rs
//!
//! Catalog endpoints. Listing needs any valid token; writes need a manager.

use axum::{
    extract::{rejection::PathRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::dto::{MovieListQuery, MovieListResponse, MovieUpsertRequest, ResultResponse};
use crate::web::extract::ValidJson;
use crate::web::state::AppState;

fn movie_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

/// POST /movie - Create a movie with its sessions
#[utoipa::path(
    post,
    path = "/movie",
    request_body = MovieUpsertRequest,
    responses(
        (status = 201, description = "Movie created", body = ResultResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Manager role required"),
        (status = 409, description = "Name taken or room already booked")
    ),
    security(("bearer_auth" = [])),
    tag = "movie"
)]
pub async fn create_movie_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(draft): ValidJson<MovieUpsertRequest>,
) -> Result<(StatusCode, Json<ResultResponse>), ApiError> {
    state.catalog.create(draft).await?;
    Ok((StatusCode::CREATED, Json(ResultResponse::success())))
}

/// GET /movie - List movies with their sessions
#[utoipa::path(
    get,
    path = "/movie",
    params(MovieListQuery),
    responses(
        (status = 200, description = "Matching movies", body = MovieListResponse),
        (status = 400, description = "Invalid query"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "movie"
)]
pub async fn list_movies_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MovieListQuery>, QueryRejection>,
) -> Result<Json<MovieListResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let filter = query.into_filter().map_err(ApiError::Validation)?;

    let page = state.catalog.list(filter).await?;
    Ok(Json(page.into()))
}

/// PUT /movie/{id} - Replace a movie and its schedule
#[utoipa::path(
    put,
    path = "/movie/{id}",
    params(("id" = Uuid, Path, description = "Movie id")),
    request_body = MovieUpsertRequest,
    responses(
        (status = 201, description = "Movie updated", body = ResultResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Manager role required"),
        (status = 404, description = "Movie not found"),
        (status = 409, description = "Name taken or room already booked")
    ),
    security(("bearer_auth" = [])),
    tag = "movie"
)]
pub async fn update_movie_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    ValidJson(draft): ValidJson<MovieUpsertRequest>,
) -> Result<(StatusCode, Json<ResultResponse>), ApiError> {
    state.catalog.update(movie_id(path)?, draft).await?;
    Ok((StatusCode::CREATED, Json(ResultResponse::success())))
}

/// DELETE /movie/{id} - Delete a movie with its sessions, tickets and history
#[utoipa::path(
    delete,
    path = "/movie/{id}",
    params(("id" = Uuid, Path, description = "Movie id")),
    responses(
        (status = 201, description = "Movie deleted", body = ResultResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Manager role required"),
        (status = 404, description = "Movie not found")
    ),
    security(("bearer_auth" = [])),
    tag = "movie"
)]
pub async fn delete_movie_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<(StatusCode, Json<ResultResponse>), ApiError> {
    state.catalog.delete(movie_id(path)?).await?;
    Ok((StatusCode::CREATED, Json(ResultResponse::success())))
}
