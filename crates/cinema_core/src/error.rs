//! crates/cinema_core/src/error.rs
//!
//! The error taxonomy every service operation reports in.

use crate::ports::{PortError, UniqueConstraint};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    /// Any store or runtime failure the service does not interpret.
    #[error("Unhandled failure: {0}")]
    Unhandled(PortError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Turns a violation of `constraint` into `Conflict(message)`; every other
    /// port error converts as usual.
    pub fn conflict_on(constraint: UniqueConstraint, message: &str) -> impl Fn(PortError) -> Self + '_ {
        move |err| match err {
            PortError::UniqueViolation(violated) if violated == constraint => {
                Self::Conflict(message.to_string())
            }
            other => Self::from(other),
        }
    }
}

/// A row the store could not find (including a dangling foreign key) is a
/// `NotFound`; anything else is left to the caller as `Unhandled`.
impl From<PortError> for ServiceError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(message) => Self::NotFound(message),
            other => Self::Unhandled(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rows_become_not_found() {
        let err = ServiceError::from(PortError::NotFound("Session 1 not found".into()));
        assert!(matches!(err, ServiceError::NotFound(msg) if msg == "Session 1 not found"));
    }

    #[test]
    fn conflict_on_only_claims_its_own_constraint() {
        let to_service = ServiceError::conflict_on(UniqueConstraint::TicketPerUser, "taken");

        assert!(matches!(
            to_service(PortError::UniqueViolation(UniqueConstraint::TicketPerUser)),
            ServiceError::Conflict(msg) if msg == "taken"
        ));
        assert!(matches!(
            to_service(PortError::UniqueViolation(UniqueConstraint::Username)),
            ServiceError::Unhandled(PortError::UniqueViolation(UniqueConstraint::Username))
        ));
        assert!(matches!(
            to_service(PortError::NotFound("User 1 not found".into())),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            to_service(PortError::Unexpected("connection reset".into())),
            ServiceError::Unhandled(PortError::Unexpected(_))
        ));
    }
}
