//! crates/cinema_core/src/identity.rs
//!
//! Registration and login. Passwords are only ever handled as salted digests;
//! a successful login yields a signed claims token valid for three hours.

use crate::domain::{Claims, NewUser, Registration, User};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{Clock, CredentialHasher, TokenSigner, UniqueConstraint, UserRepository};
use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};

/// Lifetime of every issued token.
pub const TOKEN_TTL_HOURS: i64 = 3;

/// A signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

pub struct IdentityService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    signer: Arc<dyn TokenSigner>,
    clock: Arc<dyn Clock>,
}

impl IdentityService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        signer: Arc<dyn TokenSigner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            signer,
            clock,
        }
    }

    pub async fn register(&self, registration: Registration) -> ServiceResult<User> {
        let salt = self.hasher.generate_salt();
        let password_digest = self.hasher.digest(&registration.password, &salt)?;

        let user = self
            .users
            .create_user(NewUser {
                username: registration.username,
                password_digest,
                salt,
                age: registration.age,
                role: registration.role,
            })
            .await
            .map_err(ServiceError::conflict_on(
                UniqueConstraint::Username,
                "Username already exists",
            ))?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<IssuedToken> {
        let user = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        let digest = self.hasher.digest(password, &user.salt)?;
        if digest.as_bytes() != user.password_digest.as_bytes() {
            warn!(user_id = %user.id, "Login rejected: invalid credentials");
            return Err(ServiceError::unauthorized("Invalid credentials"));
        }

        let issued_at = self.clock.now();
        let claims = Claims {
            sub: user.id,
            username: user.username,
            age: user.age,
            role: user.role,
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };
        let token = self.signer.sign(&claims)?;

        info!(user_id = %claims.sub, "Token issued");
        Ok(IssuedToken { token, claims })
    }
}
