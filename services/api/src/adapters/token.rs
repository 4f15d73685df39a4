//! services/api/src/adapters/token.rs
//!
//! HS256 JSON Web Tokens for the `TokenSigner` port. Expiry is checked against
//! the injected clock instead of the system time.

use cinema_core::domain::Claims;
use cinema_core::ports::{Clock, PortError, PortResult, TokenSigner};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;

pub struct JwtSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtSigner {
    pub fn new(secret: &str, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        }
    }
}

impl TokenSigner for JwtSigner {
    fn sign(&self, claims: &Claims) -> PortResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| PortError::Unexpected(format!("Failed to sign token: {}", e)))
    }

    fn verify(&self, token: &str) -> PortResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| PortError::Unauthorized(e.to_string()))?
            .claims;

        if claims.exp <= self.clock.now().timestamp() {
            return Err(PortError::Unauthorized("Token expired".to_string()));
        }
        Ok(claims)
    }
}
