//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! store ports from the `core` crate. It handles all interactions with the
//! PostgreSQL database using `sqlx`.
//!
//! Uniqueness is left to the schema: a violated constraint is reported by name
//! and translated into the matching `UniqueConstraint`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use cinema_core::domain::{
    BookedSession, HistoryEntry, Movie, MovieFilter, MovieSort, MovieWithSessions, NewUser,
    Pagination, Role, Session, SessionKey, SortOrder, Ticket, TimeSlot, User, WatchHistory,
};
use cinema_core::ports::{
    CatalogRepository, CatalogTransaction, HistoryRepository, PortError, PortResult,
    TicketRepository, UniqueConstraint, UserRepository,
};
use sqlx::error::ErrorKind;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every store port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// Error Translation
//=========================================================================================

fn constraint_for(name: &str) -> Option<UniqueConstraint> {
    match name {
        "users_username_key" => Some(UniqueConstraint::Username),
        "movies_name_key" => Some(UniqueConstraint::MovieName),
        "sessions_slot_key" => Some(UniqueConstraint::SessionSlot),
        "tickets_session_user_key" => Some(UniqueConstraint::TicketPerUser),
        "watch_history_movie_user_key" => Some(UniqueConstraint::HistoryPerUser),
        _ => None,
    }
}

/// Maps write failures: named unique violations become `UniqueViolation`, a
/// dangling reference (the row it points at was deleted) becomes `NotFound`.
fn map_write_error(err: sqlx::Error) -> PortError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.kind() {
            ErrorKind::UniqueViolation => {
                if let Some(constraint) = db_err.constraint().and_then(constraint_for) {
                    return PortError::UniqueViolation(constraint);
                }
            }
            ErrorKind::ForeignKeyViolation => {
                return PortError::NotFound(format!(
                    "Referenced row is missing ({})",
                    db_err.constraint().unwrap_or("unknown constraint")
                ));
            }
            _ => {}
        }
    }
    unexpected(err)
}

fn unexpected(err: sqlx::Error) -> PortError {
    PortError::Unexpected(err.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    password_digest: String,
    salt: String,
    age: i32,
    role: String,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(User {
            id: self.id,
            username: self.username,
            password_digest: self.password_digest,
            salt: self.salt,
            age: self.age,
            role,
        })
    }
}

#[derive(FromRow)]
struct MovieRecord {
    id: Uuid,
    name: String,
    min_age: i32,
}
impl MovieRecord {
    fn to_domain(self) -> Movie {
        Movie {
            id: self.id,
            name: self.name,
            min_age: self.min_age,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    movie_id: Uuid,
    date: NaiveDate,
    time_slot: i16,
    room_number: i32,
}
impl SessionRecord {
    fn to_domain(self) -> PortResult<Session> {
        let time_slot =
            TimeSlot::new(i64::from(self.time_slot)).map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Session {
            id: self.id,
            movie_id: self.movie_id,
            date: self.date,
            time_slot,
            room_number: self.room_number,
        })
    }
}

#[derive(FromRow)]
struct TicketRecord {
    id: Uuid,
    session_id: Uuid,
    user_id: Uuid,
}
impl TicketRecord {
    fn to_domain(self) -> Ticket {
        Ticket {
            id: self.id,
            session_id: self.session_id,
            user_id: self.user_id,
        }
    }
}

/// A session row joined to its movie.
#[derive(FromRow)]
struct ScreeningRecord {
    #[sqlx(flatten)]
    session: SessionRecord,
    movie_name: String,
    movie_min_age: i32,
}
impl ScreeningRecord {
    fn to_domain(self) -> PortResult<(Session, Movie)> {
        let movie = Movie {
            id: self.session.movie_id,
            name: self.movie_name,
            min_age: self.movie_min_age,
        };
        Ok((self.session.to_domain()?, movie))
    }
}

#[derive(FromRow)]
struct WatchHistoryRecord {
    id: Uuid,
    movie_id: Uuid,
    user_id: Uuid,
    watched_at: DateTime<Utc>,
}
impl WatchHistoryRecord {
    fn to_domain(self) -> WatchHistory {
        WatchHistory {
            id: self.id,
            movie_id: self.movie_id,
            user_id: self.user_id,
            watched_at: self.watched_at,
        }
    }
}

#[derive(FromRow)]
struct HistoryEntryRecord {
    movie_id: Uuid,
    movie_name: String,
    watched_at: DateTime<Utc>,
}
impl HistoryEntryRecord {
    fn to_domain(self) -> HistoryEntry {
        HistoryEntry {
            movie_id: self.movie_id,
            movie_name: self.movie_name,
            watched_at: self.watched_at,
        }
    }
}

//=========================================================================================
// Query Helpers
//=========================================================================================

const SESSION_COLUMNS: &str = "id, movie_id, date, time_slot, room_number";

/// Escapes LIKE wildcards so the name filter is a plain substring match.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// `SELECT <select> FROM movies` with the filter's WHERE clause.
fn filtered_movies(select: &str, filter: &MovieFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM movies WHERE TRUE", select));
    if let Some(name) = &filter.name {
        builder.push(" AND name ILIKE ").push_bind(like_pattern(name));
    }
    if let Some(age) = filter.permitted_for_age {
        builder.push(" AND min_age <= ").push_bind(age);
    }
    builder
}

fn push_page(builder: &mut QueryBuilder<'static, Postgres>, pagination: Option<Pagination>) {
    if let Some(page) = pagination {
        builder
            .push(" LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
    }
}

fn sessions_to_domain(records: Vec<SessionRecord>) -> PortResult<Vec<Session>> {
    records.into_iter().map(SessionRecord::to_domain).collect()
}

//=========================================================================================
// `UserRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserRepository for DbAdapter {
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, username, password_digest, salt, age, role) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, username, password_digest, salt, age, role",
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.password_digest)
        .bind(&user.salt)
        .bind(user.age)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        record.to_domain()
    }

    async fn find_user_by_username(&self, username: &str) -> PortResult<Option<User>> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_digest, salt, age, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(UserRecord::to_domain)
        .transpose()
    }
}

//=========================================================================================
// `CatalogRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogRepository for DbAdapter {
    async fn begin(&self) -> PortResult<Box<dyn CatalogTransaction>> {
        let tx = self.pool.begin().await.map_err(unexpected)?;
        Ok(Box::new(PgCatalogTransaction { tx }))
    }

    async fn list_movies(&self, filter: &MovieFilter) -> PortResult<(Vec<MovieWithSessions>, u64)> {
        let total: i64 = filtered_movies("COUNT(*)", filter)
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        let column = match filter.sort_by {
            MovieSort::Id => "id",
            MovieSort::Name => "name",
            MovieSort::MinAge => "min_age",
        };
        let direction = match filter.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let mut builder = filtered_movies("id, name, min_age", filter);
        builder.push(format!(" ORDER BY {} {}, id ASC", column, direction));
        push_page(&mut builder, filter.pagination);

        let movies: Vec<Movie> = builder
            .build_query_as::<MovieRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?
            .into_iter()
            .map(MovieRecord::to_domain)
            .collect();

        let movie_ids: Vec<Uuid> = movies.iter().map(|m| m.id).collect();
        let session_records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM sessions WHERE movie_id = ANY($1) ORDER BY date, time_slot, room_number",
            SESSION_COLUMNS
        ))
        .bind(&movie_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut by_movie: HashMap<Uuid, Vec<Session>> = HashMap::new();
        for session in sessions_to_domain(session_records)? {
            by_movie.entry(session.movie_id).or_default().push(session);
        }

        let listed = movies
            .into_iter()
            .map(|movie| MovieWithSessions {
                sessions: by_movie.remove(&movie.id).unwrap_or_default(),
                movie,
            })
            .collect();

        Ok((listed, total.max(0) as u64))
    }

    async fn find_session_with_movie(&self, session_id: Uuid) -> PortResult<Option<(Session, Movie)>> {
        sqlx::query_as::<_, ScreeningRecord>(
            "SELECT s.id, s.movie_id, s.date, s.time_slot, s.room_number, \
                    m.name AS movie_name, m.min_age AS movie_min_age \
             FROM sessions s JOIN movies m ON m.id = s.movie_id \
             WHERE s.id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(ScreeningRecord::to_domain)
        .transpose()
    }
}

//=========================================================================================
// `CatalogTransaction` Implementation
//=========================================================================================

/// A catalog transaction. `sqlx` rolls it back when dropped uncommitted.
pub struct PgCatalogTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CatalogTransaction for PgCatalogTransaction {
    async fn find_movie(&mut self, movie_id: Uuid) -> PortResult<Option<Movie>> {
        let record = sqlx::query_as::<_, MovieRecord>(
            "SELECT id, name, min_age FROM movies WHERE id = $1 FOR UPDATE",
        )
        .bind(movie_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(unexpected)?;
        Ok(record.map(MovieRecord::to_domain))
    }

    async fn find_movie_with_sessions(&mut self, movie_id: Uuid) -> PortResult<Option<MovieWithSessions>> {
        let Some(movie) = self.find_movie(movie_id).await? else {
            return Ok(None);
        };
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM sessions WHERE movie_id = $1 ORDER BY date, time_slot, room_number",
            SESSION_COLUMNS
        ))
        .bind(movie_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(unexpected)?;

        Ok(Some(MovieWithSessions {
            movie,
            sessions: sessions_to_domain(records)?,
        }))
    }

    async fn insert_movie(&mut self, name: &str, min_age: i32) -> PortResult<Movie> {
        let record = sqlx::query_as::<_, MovieRecord>(
            "INSERT INTO movies (id, name, min_age) VALUES ($1, $2, $3) RETURNING id, name, min_age",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(min_age)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_write_error)?;
        Ok(record.to_domain())
    }

    async fn update_movie(&mut self, movie: &Movie) -> PortResult<Movie> {
        let record = sqlx::query_as::<_, MovieRecord>(
            "UPDATE movies SET name = $2, min_age = $3 WHERE id = $1 RETURNING id, name, min_age",
        )
        .bind(movie.id)
        .bind(&movie.name)
        .bind(movie.min_age)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_write_error)?
        .ok_or_else(|| PortError::NotFound(format!("Movie {} not found", movie.id)))?;
        Ok(record.to_domain())
    }

    async fn delete_movie(&mut self, movie_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(movie_id)
            .execute(&mut *self.tx)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Movie {} not found", movie_id)));
        }
        Ok(())
    }

    async fn insert_sessions(&mut self, movie_id: Uuid, keys: &[SessionKey]) -> PortResult<Vec<Session>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO sessions (id, movie_id, date, time_slot, room_number) ");
        builder.push_values(keys, |mut row, key| {
            row.push_bind(Uuid::new_v4())
                .push_bind(movie_id)
                .push_bind(key.date)
                .push_bind(i16::from(key.time_slot.index()))
                .push_bind(key.room_number);
        });
        builder.push(format!(" RETURNING {}", SESSION_COLUMNS));

        let records = builder
            .build_query_as::<SessionRecord>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_write_error)?;
        sessions_to_domain(records)
    }

    async fn delete_sessions(&mut self, session_ids: &[Uuid]) -> PortResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ANY($1)")
            .bind(session_ids)
            .execute(&mut *self.tx)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> PortResult<()> {
        self.tx.commit().await.map_err(unexpected)
    }
}

//=========================================================================================
// `TicketRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl TicketRepository for DbAdapter {
    async fn insert_ticket(&self, session_id: Uuid, user_id: Uuid) -> PortResult<Ticket> {
        let record = sqlx::query_as::<_, TicketRecord>(
            "INSERT INTO tickets (id, session_id, user_id) VALUES ($1, $2, $3) \
             RETURNING id, session_id, user_id",
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(record.to_domain())
    }

    async fn find_booked_session(&self, user_id: Uuid, session_id: Uuid) -> PortResult<Option<BookedSession>> {
        let Some(ticket) = sqlx::query_as::<_, TicketRecord>(
            "SELECT id, session_id, user_id FROM tickets WHERE user_id = $1 AND session_id = $2",
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        else {
            return Ok(None);
        };

        Ok(self
            .find_session_with_movie(session_id)
            .await?
            .map(|(session, movie)| BookedSession {
                ticket: ticket.to_domain(),
                session,
                movie,
            }))
    }
}

//=========================================================================================
// `HistoryRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl HistoryRepository for DbAdapter {
    async fn upsert_watch(
        &self,
        movie_id: Uuid,
        user_id: Uuid,
        watched_at: DateTime<Utc>,
    ) -> PortResult<WatchHistory> {
        let record = sqlx::query_as::<_, WatchHistoryRecord>(
            "INSERT INTO watch_history (id, movie_id, user_id, watched_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT ON CONSTRAINT watch_history_movie_user_key \
             DO UPDATE SET watched_at = EXCLUDED.watched_at \
             RETURNING id, movie_id, user_id, watched_at",
        )
        .bind(Uuid::new_v4())
        .bind(movie_id)
        .bind(user_id)
        .bind(watched_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(record.to_domain())
    }

    async fn list_history(
        &self,
        user_id: Uuid,
        pagination: Option<Pagination>,
    ) -> PortResult<(Vec<HistoryEntry>, u64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM watch_history WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        let mut builder = QueryBuilder::new(
            "SELECT h.movie_id, m.name AS movie_name, h.watched_at \
             FROM watch_history h JOIN movies m ON m.id = h.movie_id \
             WHERE h.user_id = ",
        );
        builder.push_bind(user_id).push(" ORDER BY h.watched_at DESC");
        push_page(&mut builder, pagination);

        let entries = builder
            .build_query_as::<HistoryEntryRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?
            .into_iter()
            .map(HistoryEntryRecord::to_domain)
            .collect();

        Ok((entries, total.max(0) as u64))
    }
}
