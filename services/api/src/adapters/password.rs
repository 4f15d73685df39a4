//! services/api/src/adapters/password.rs
//!
//! Argon2id implementation of the `CredentialHasher` port. The salt is kept in
//! its own column, so the digest is the raw Argon2 output rather than a PHC string.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Algorithm, Argon2, Params, Version,
};
use cinema_core::ports::{CredentialHasher, PortError, PortResult};

const DIGEST_LEN: usize = 32;

pub struct Argon2CredentialHasher {
    params: Params,
}

impl Argon2CredentialHasher {
    /// Creates a hasher with the given cost parameters. Tests use cheap ones.
    pub fn new(params: Params) -> Self {
        Self { params }
    }
}

impl Default for Argon2CredentialHasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl CredentialHasher for Argon2CredentialHasher {
    fn generate_salt(&self) -> String {
        SaltString::generate(&mut OsRng).as_str().to_string()
    }

    fn digest(&self, password: &str, salt: &str) -> PortResult<String> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let mut output = [0u8; DIGEST_LEN];
        argon2
            .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut output)
            .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {}", e)))?;
        Ok(hex::encode(output))
    }
}
