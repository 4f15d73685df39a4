//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its rendering
//! as RFC 9457 problem details.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cinema_core::ports::PortError;
use cinema_core::ServiceError;
use serde::Serialize;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A business rule or store failure reported by a core service.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The request body or query failed validation.
    #[error("{0}")]
    Validation(String),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying the schema migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        Self::Service(ServiceError::from(err))
    }
}

/// RFC 9457 problem details body.
#[derive(Debug, Serialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Problem {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            type_uri: format!("https://httpstatuses.io/{}", status.as_u16()),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status: status.as_u16(),
            detail: Some(detail.into()),
        }
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Service(ServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Service(ServiceError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Service(ServiceError::BadRequest(_)) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Service(ServiceError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
            Self::Service(ServiceError::Forbidden(_)) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "An unexpected error occurred".to_string()
        } else {
            self.to_string()
        };
        Problem::new(status, detail).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_their_status() {
        let cases = [
            (ServiceError::not_found("x"), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::bad_request("x"), StatusCode::BAD_REQUEST),
            (ServiceError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (ServiceError::forbidden("x"), StatusCode::FORBIDDEN),
            (
                ServiceError::Unhandled(PortError::Unexpected("db down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn dangling_rows_from_the_store_are_not_found() {
        let err = ApiError::from(PortError::NotFound("Session 7 not found".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(PortError::Unexpected("pool closed".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn server_errors_hide_their_cause() {
        let response = ApiError::Internal("secret detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let problem = Problem::new(StatusCode::CONFLICT, "Movie already exists");
        assert_eq!(problem.title, "Conflict");
        assert_eq!(problem.type_uri, "https://httpstatuses.io/409");
    }
}
