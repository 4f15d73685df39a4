//! crates/cinema_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the database, the password primitive and the token format.

use crate::domain::{
    BookedSession, Claims, HistoryEntry, Movie, MovieFilter, MovieWithSessions, NewUser,
    Pagination, Session, SessionKey, Ticket, User, WatchHistory,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The uniqueness rules the store enforces on behalf of the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueConstraint {
    Username,
    MovieName,
    SessionSlot,
    TicketPerUser,
    HistoryPerUser,
}

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, signer).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unique constraint violated: {0:?}")]
    UniqueViolation(UniqueConstraint),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Store Ports
//=========================================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> PortResult<User>;

    async fn find_user_by_username(&self, username: &str) -> PortResult<Option<User>>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Opens a transaction. Dropping the handle without `commit` rolls it back.
    async fn begin(&self) -> PortResult<Box<dyn CatalogTransaction>>;

    /// Returns the requested page of movies, each with its sessions, plus the
    /// number of movies matching the filter before pagination.
    async fn list_movies(&self, filter: &MovieFilter) -> PortResult<(Vec<MovieWithSessions>, u64)>;

    async fn find_session_with_movie(&self, session_id: Uuid) -> PortResult<Option<(Session, Movie)>>;
}

/// Catalog writes that must succeed or fail together.
#[async_trait]
pub trait CatalogTransaction: Send {
    async fn find_movie(&mut self, movie_id: Uuid) -> PortResult<Option<Movie>>;

    async fn find_movie_with_sessions(&mut self, movie_id: Uuid) -> PortResult<Option<MovieWithSessions>>;

    async fn insert_movie(&mut self, name: &str, min_age: i32) -> PortResult<Movie>;

    async fn update_movie(&mut self, movie: &Movie) -> PortResult<Movie>;

    async fn delete_movie(&mut self, movie_id: Uuid) -> PortResult<()>;

    async fn insert_sessions(&mut self, movie_id: Uuid, keys: &[SessionKey]) -> PortResult<Vec<Session>>;

    async fn delete_sessions(&mut self, session_ids: &[Uuid]) -> PortResult<()>;

    async fn commit(self: Box<Self>) -> PortResult<()>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn insert_ticket(&self, session_id: Uuid, user_id: Uuid) -> PortResult<Ticket>;

    /// Loads `user_id`'s ticket for `session_id` together with the session and movie.
    async fn find_booked_session(&self, user_id: Uuid, session_id: Uuid) -> PortResult<Option<BookedSession>>;
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Inserts the (movie, user) record or moves its `watched_at` to the given instant.
    async fn upsert_watch(
        &self,
        movie_id: Uuid,
        user_id: Uuid,
        watched_at: DateTime<Utc>,
    ) -> PortResult<WatchHistory>;

    /// Returns the user's entries, most recent first, plus the total number of entries.
    async fn list_history(
        &self,
        user_id: Uuid,
        pagination: Option<Pagination>,
    ) -> PortResult<(Vec<HistoryEntry>, u64)>;
}

//=========================================================================================
// Primitive Ports
//=========================================================================================

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The process wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// One-way password digest with a per-user salt.
pub trait CredentialHasher: Send + Sync {
    /// Produces a fresh random salt.
    fn generate_salt(&self) -> String;

    /// Derives the digest of `password` under `salt`. Must be deterministic.
    fn digest(&self, password: &str, salt: &str) -> PortResult<String>;
}

/// Signs and verifies claims tokens.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &Claims) -> PortResult<String>;

    /// Checks signature and expiry. Any failure is `PortError::Unauthorized`.
    fn verify(&self, token: &str) -> PortResult<Claims>;
}
