pub mod db;
pub mod password;
pub mod token;

pub use db::DbAdapter;
pub use password::Argon2CredentialHasher;
pub use token::JwtSigner;
