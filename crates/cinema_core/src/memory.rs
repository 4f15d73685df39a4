//! crates/cinema_core/src/memory.rs
//!
//! In-memory implementations of every store port plus a hand-driven clock.
//! The tables enforce the same unique keys, foreign keys and cascades as the
//! Postgres schema, so services behave identically against either store.

use crate::domain::{
    BookedSession, HistoryEntry, Movie, MovieFilter, MovieSort, MovieWithSessions, NewUser,
    Pagination, Session, SessionKey, SortOrder, Ticket, User, WatchHistory,
};
use crate::ports::{
    CatalogRepository, CatalogTransaction, Clock, HistoryRepository, PortError, PortResult,
    TicketRepository, UniqueConstraint, UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct Tables {
    users: Vec<User>,
    movies: Vec<Movie>,
    sessions: Vec<Session>,
    tickets: Vec<Ticket>,
    history: Vec<WatchHistory>,
}

impl Tables {
    fn movie(&self, movie_id: Uuid) -> Option<&Movie> {
        self.movies.iter().find(|m| m.id == movie_id)
    }

    fn sessions_of(&self, movie_id: Uuid) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .sessions
            .iter()
            .filter(|s| s.movie_id == movie_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.date, s.time_slot, s.room_number));
        sessions
    }

    fn insert_movie(&mut self, movie: Movie) -> PortResult<()> {
        if self.movies.iter().any(|m| m.name == movie.name) {
            return Err(PortError::UniqueViolation(UniqueConstraint::MovieName));
        }
        self.movies.push(movie);
        Ok(())
    }

    fn update_movie(&mut self, movie: &Movie) -> PortResult<Movie> {
        if self.movies.iter().any(|m| m.name == movie.name && m.id != movie.id) {
            return Err(PortError::UniqueViolation(UniqueConstraint::MovieName));
        }
        let stored = self
            .movies
            .iter_mut()
            .find(|m| m.id == movie.id)
            .ok_or_else(|| PortError::NotFound(format!("Movie {} not found", movie.id)))?;
        *stored = movie.clone();
        Ok(movie.clone())
    }

    fn delete_movie(&mut self, movie_id: Uuid) -> PortResult<()> {
        let before = self.movies.len();
        self.movies.retain(|m| m.id != movie_id);
        if self.movies.len() == before {
            return Err(PortError::NotFound(format!("Movie {} not found", movie_id)));
        }
        let doomed: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|s| s.movie_id == movie_id)
            .map(|s| s.id)
            .collect();
        self.remove_sessions(&doomed);
        self.history.retain(|h| h.movie_id != movie_id);
        Ok(())
    }

    /// All or nothing: a taken slot (in the table or earlier in `sessions`)
    /// leaves the table untouched.
    fn insert_sessions(&mut self, sessions: &[Session]) -> PortResult<()> {
        for (i, session) in sessions.iter().enumerate() {
            if self.movie(session.movie_id).is_none() {
                return Err(PortError::NotFound(format!("Movie {} not found", session.movie_id)));
            }
            let key = session.key();
            let taken = self.sessions.iter().any(|s| s.key() == key)
                || sessions[..i].iter().any(|s| s.key() == key);
            if taken {
                return Err(PortError::UniqueViolation(UniqueConstraint::SessionSlot));
            }
        }
        self.sessions.extend_from_slice(sessions);
        Ok(())
    }

    fn remove_sessions(&mut self, session_ids: &[Uuid]) {
        self.sessions.retain(|s| !session_ids.contains(&s.id));
        self.tickets.retain(|t| !session_ids.contains(&t.session_id));
    }
}

/// A shared set of tables implementing all repository ports.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a user along with their tickets and history.
    pub fn delete_user(&self, user_id: Uuid) {
        let mut tables = self.tables.lock();
        tables.users.retain(|u| u.id != user_id);
        tables.tickets.retain(|t| t.user_id != user_id);
        tables.history.retain(|h| h.user_id != user_id);
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().sessions.len()
    }

    pub fn ticket_count(&self) -> usize {
        self.tables.lock().tickets.len()
    }

    pub fn history_count(&self) -> usize {
        self.tables.lock().history.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let mut tables = self.tables.lock();
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(PortError::UniqueViolation(UniqueConstraint::Username));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            password_digest: user.password_digest,
            salt: user.salt,
            age: user.age,
            role: user.role,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> PortResult<Option<User>> {
        let tables = self.tables.lock();
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn begin(&self) -> PortResult<Box<dyn CatalogTransaction>> {
        let working = self.tables.lock().clone();
        Ok(Box::new(MemoryTransaction {
            tables: self.tables.clone(),
            working,
            changes: Vec::new(),
        }))
    }

    async fn list_movies(&self, filter: &MovieFilter) -> PortResult<(Vec<MovieWithSessions>, u64)> {
        let tables = self.tables.lock();
        let needle = filter.name.as_ref().map(|n| n.to_lowercase());

        let mut movies: Vec<&Movie> = tables
            .movies
            .iter()
            .filter(|m| {
                needle
                    .as_ref()
                    .map_or(true, |n| m.name.to_lowercase().contains(n.as_str()))
            })
            .filter(|m| filter.permitted_for_age.map_or(true, |age| m.min_age <= age))
            .collect();

        movies.sort_by(|a, b| {
            let ordering = match filter.sort_by {
                MovieSort::Id => a.id.cmp(&b.id),
                MovieSort::Name => a.name.cmp(&b.name),
                MovieSort::MinAge => a.min_age.cmp(&b.min_age),
            };
            let ordering = match filter.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            ordering.then_with(|| a.id.cmp(&b.id))
        });

        let total = movies.len() as u64;
        let page = paginate(movies, filter.pagination)
            .into_iter()
            .map(|movie| MovieWithSessions {
                movie: movie.clone(),
                sessions: tables.sessions_of(movie.id),
            })
            .collect();

        Ok((page, total))
    }

    async fn find_session_with_movie(&self, session_id: Uuid) -> PortResult<Option<(Session, Movie)>> {
        let tables = self.tables.lock();
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .and_then(|s| tables.movie(s.movie_id).map(|m| (s.clone(), m.clone()))))
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn insert_ticket(&self, session_id: Uuid, user_id: Uuid) -> PortResult<Ticket> {
        let mut tables = self.tables.lock();
        if !tables.sessions.iter().any(|s| s.id == session_id) {
            return Err(PortError::NotFound(format!("Session {} not found", session_id)));
        }
        if !tables.users.iter().any(|u| u.id == user_id) {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        if tables
            .tickets
            .iter()
            .any(|t| t.session_id == session_id && t.user_id == user_id)
        {
            return Err(PortError::UniqueViolation(UniqueConstraint::TicketPerUser));
        }
        let ticket = Ticket {
            id: Uuid::new_v4(),
            session_id,
            user_id,
        };
        tables.tickets.push(ticket.clone());
        Ok(ticket)
    }

    async fn find_booked_session(&self, user_id: Uuid, session_id: Uuid) -> PortResult<Option<BookedSession>> {
        let tables = self.tables.lock();
        let Some(ticket) = tables
            .tickets
            .iter()
            .find(|t| t.user_id == user_id && t.session_id == session_id)
        else {
            return Ok(None);
        };
        let session = tables.sessions.iter().find(|s| s.id == ticket.session_id);
        let movie = session.and_then(|s| tables.movie(s.movie_id));

        Ok(session.zip(movie).map(|(session, movie)| BookedSession {
            ticket: ticket.clone(),
            session: session.clone(),
            movie: movie.clone(),
        }))
    }
}

#[async_trait]
impl HistoryRepository for MemoryStore {
    async fn upsert_watch(
        &self,
        movie_id: Uuid,
        user_id: Uuid,
        watched_at: DateTime<Utc>,
    ) -> PortResult<WatchHistory> {
        let mut tables = self.tables.lock();
        if tables.movie(movie_id).is_none() {
            return Err(PortError::NotFound(format!("Movie {} not found", movie_id)));
        }
        if let Some(existing) = tables
            .history
            .iter_mut()
            .find(|h| h.movie_id == movie_id && h.user_id == user_id)
        {
            existing.watched_at = watched_at;
            return Ok(existing.clone());
        }
        let record = WatchHistory {
            id: Uuid::new_v4(),
            movie_id,
            user_id,
            watched_at,
        };
        tables.history.push(record.clone());
        Ok(record)
    }

    async fn list_history(
        &self,
        user_id: Uuid,
        pagination: Option<Pagination>,
    ) -> PortResult<(Vec<HistoryEntry>, u64)> {
        let tables = self.tables.lock();
        let mut entries: Vec<HistoryEntry> = tables
            .history
            .iter()
            .filter(|h| h.user_id == user_id)
            .filter_map(|h| {
                tables.movie(h.movie_id).map(|m| HistoryEntry {
                    movie_id: h.movie_id,
                    movie_name: m.name.clone(),
                    watched_at: h.watched_at,
                })
            })
            .collect();
        entries.sort_by(|a, b| b.watched_at.cmp(&a.watched_at));

        let total = entries.len() as u64;
        Ok((paginate(entries, pagination), total))
    }
}

fn paginate<T>(items: Vec<T>, pagination: Option<Pagination>) -> Vec<T> {
    match pagination {
        Some(page) => items
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect(),
        None => items,
    }
}

/// A catalog write made inside a transaction, replayed onto the live tables
/// at commit.
#[derive(Debug, Clone)]
enum CatalogChange {
    InsertMovie(Movie),
    UpdateMovie(Movie),
    DeleteMovie(Uuid),
    InsertSessions(Vec<Session>),
    DeleteSessions(Vec<Uuid>),
}

impl CatalogChange {
    fn apply(&self, tables: &mut Tables) -> PortResult<()> {
        match self {
            Self::InsertMovie(movie) => tables.insert_movie(movie.clone()),
            Self::UpdateMovie(movie) => tables.update_movie(movie).map(|_| ()),
            Self::DeleteMovie(movie_id) => tables.delete_movie(*movie_id),
            Self::InsertSessions(sessions) => tables.insert_sessions(sessions),
            Self::DeleteSessions(session_ids) => {
                tables.remove_sessions(session_ids);
                Ok(())
            }
        }
    }
}

/// Reads see a snapshot taken at `begin` plus this transaction's own writes.
/// Commit replays the writes onto whatever the store holds by then, so rows
/// written outside the transaction in the meantime survive.
struct MemoryTransaction {
    tables: Arc<Mutex<Tables>>,
    working: Tables,
    changes: Vec<CatalogChange>,
}

impl MemoryTransaction {
    fn record(&mut self, change: CatalogChange) -> PortResult<()> {
        change.apply(&mut self.working)?;
        self.changes.push(change);
        Ok(())
    }
}

#[async_trait]
impl CatalogTransaction for MemoryTransaction {
    async fn find_movie(&mut self, movie_id: Uuid) -> PortResult<Option<Movie>> {
        Ok(self.working.movie(movie_id).cloned())
    }

    async fn find_movie_with_sessions(&mut self, movie_id: Uuid) -> PortResult<Option<MovieWithSessions>> {
        Ok(self.working.movie(movie_id).cloned().map(|movie| MovieWithSessions {
            sessions: self.working.sessions_of(movie.id),
            movie,
        }))
    }

    async fn insert_movie(&mut self, name: &str, min_age: i32) -> PortResult<Movie> {
        let movie = Movie {
            id: Uuid::new_v4(),
            name: name.to_string(),
            min_age,
        };
        self.record(CatalogChange::InsertMovie(movie.clone()))?;
        Ok(movie)
    }

    async fn update_movie(&mut self, movie: &Movie) -> PortResult<Movie> {
        self.record(CatalogChange::UpdateMovie(movie.clone()))?;
        Ok(movie.clone())
    }

    async fn delete_movie(&mut self, movie_id: Uuid) -> PortResult<()> {
        self.record(CatalogChange::DeleteMovie(movie_id))
    }

    async fn insert_sessions(&mut self, movie_id: Uuid, keys: &[SessionKey]) -> PortResult<Vec<Session>> {
        let sessions: Vec<Session> = keys
            .iter()
            .map(|key| Session {
                id: Uuid::new_v4(),
                movie_id,
                date: key.date,
                time_slot: key.time_slot,
                room_number: key.room_number,
            })
            .collect();
        self.record(CatalogChange::InsertSessions(sessions.clone()))?;
        Ok(sessions)
    }

    async fn delete_sessions(&mut self, session_ids: &[Uuid]) -> PortResult<()> {
        self.record(CatalogChange::DeleteSessions(session_ids.to_vec()))
    }

    async fn commit(self: Box<Self>) -> PortResult<()> {
        let mut live = self.tables.lock();
        let mut next = live.clone();
        for change in &self.changes {
            change.apply(&mut next)?;
        }
        *live = next;
        Ok(())
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
