//! crates/cinema_core/src/access.rs
//!
//! The two request guards: who is calling, and may they change the catalog.

use crate::domain::{Claims, Role};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{PortError, TokenSigner};
use std::sync::Arc;
use tracing::debug;

pub struct AccessGate {
    signer: Arc<dyn TokenSigner>,
}

impl AccessGate {
    pub fn new(signer: Arc<dyn TokenSigner>) -> Self {
        Self { signer }
    }

    /// Verifies a bearer token. A missing token is passed as `None`.
    pub fn authenticate(&self, token: Option<&str>) -> ServiceResult<Claims> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::unauthorized("Missing bearer token"))?;

        self.signer.verify(token).map_err(|err| match err {
            PortError::Unauthorized(reason) => {
                debug!(%reason, "Token rejected");
                ServiceError::unauthorized("Invalid or expired token")
            }
            other => ServiceError::Unhandled(other),
        })
    }

    /// Lets only managers through.
    pub fn authorize_manager(&self, claims: &Claims) -> ServiceResult<()> {
        if claims.role == Role::Manager {
            Ok(())
        } else {
            debug!(user_id = %claims.sub, "Manager role required");
            Err(ServiceError::forbidden("Manager role required"))
        }
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_requires_the_scheme() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer  abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
