//! crates/cinema_core/src/catalog.rs
//!
//! Movie and session management. Every write runs inside one catalog
//! transaction, so a session conflict also undoes the movie write.

use crate::domain::{Movie, MovieDraft, MovieFilter, MovieWithSessions, Page, Session, SessionKey};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{CatalogRepository, UniqueConstraint};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const MOVIE_EXISTS: &str = "Movie already exists";
const ROOM_CONFLICT: &str = "Sessions could not be created due to conflict in rooms";
const MOVIE_NOT_FOUND: &str = "Movie not found";

/// The session changes needed to turn an existing schedule into a proposed one.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SessionDiff {
    pub to_delete: Vec<Uuid>,
    pub to_insert: Vec<SessionKey>,
}

impl SessionDiff {
    /// Compares schedules by `(date, time slot, room)`. Sessions present in
    /// both are left alone; a moved session is a delete plus an insert.
    pub fn between(existing: &[Session], proposed: &[SessionKey]) -> Self {
        let existing_keys: HashSet<SessionKey> = existing.iter().map(Session::key).collect();
        let proposed_keys: HashSet<&SessionKey> = proposed.iter().collect();

        Self {
            to_delete: existing
                .iter()
                .filter(|session| !proposed_keys.contains(&session.key()))
                .map(|session| session.id)
                .collect(),
            to_insert: proposed
                .iter()
                .filter(|key| !existing_keys.contains(*key))
                .copied()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_insert.is_empty()
    }
}

pub struct CatalogService {
    repository: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn CatalogRepository>) -> Self {
        Self { repository }
    }

    /// Creates a movie together with its sessions.
    pub async fn create(&self, draft: MovieDraft) -> ServiceResult<MovieWithSessions> {
        let mut tx = self.repository.begin().await?;

        let movie = tx
            .insert_movie(&draft.name, draft.min_age)
            .await
            .map_err(ServiceError::conflict_on(UniqueConstraint::MovieName, MOVIE_EXISTS))?;

        let sessions = tx
            .insert_sessions(movie.id, &draft.sessions)
            .await
            .map_err(ServiceError::conflict_on(UniqueConstraint::SessionSlot, ROOM_CONFLICT))?;

        tx.commit().await?;
        info!(movie_id = %movie.id, sessions = sessions.len(), "Movie created");

        Ok(MovieWithSessions { movie, sessions })
    }

    /// Replaces a movie's name, age limit and schedule.
    pub async fn update(&self, movie_id: Uuid, draft: MovieDraft) -> ServiceResult<()> {
        let mut tx = self.repository.begin().await?;

        let existing = tx
            .find_movie_with_sessions(movie_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(MOVIE_NOT_FOUND))?;

        let movie = Movie {
            id: existing.movie.id,
            name: draft.name,
            min_age: draft.min_age,
        };
        tx.update_movie(&movie)
            .await
            .map_err(ServiceError::conflict_on(UniqueConstraint::MovieName, MOVIE_EXISTS))?;

        let diff = SessionDiff::between(&existing.sessions, &draft.sessions);
        if !diff.to_delete.is_empty() {
            tx.delete_sessions(&diff.to_delete).await?;
        }
        if !diff.to_insert.is_empty() {
            tx.insert_sessions(movie.id, &diff.to_insert)
                .await
                .map_err(ServiceError::conflict_on(UniqueConstraint::SessionSlot, ROOM_CONFLICT))?;
        }

        tx.commit().await?;
        info!(
            movie_id = %movie.id,
            deleted = diff.to_delete.len(),
            inserted = diff.to_insert.len(),
            "Movie updated"
        );
        Ok(())
    }

    pub async fn list(&self, mut filter: MovieFilter) -> ServiceResult<Page<MovieWithSessions>> {
        // An age of zero or less means the caller did not ask for an age filter.
        filter.permitted_for_age = filter.permitted_for_age.filter(|age| *age > 0);
        let (movies, total_count) = self.repository.list_movies(&filter).await?;
        Ok(Page::new(movies, total_count, filter.pagination))
    }

    /// Deletes a movie; its sessions, tickets and history go with it.
    pub async fn delete(&self, movie_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.repository.begin().await?;

        if tx.find_movie(movie_id).await?.is_none() {
            warn!(%movie_id, "Delete requested for unknown movie");
            return Err(ServiceError::not_found(MOVIE_NOT_FOUND));
        }
        tx.delete_movie(movie_id).await?;

        tx.commit().await?;
        info!(%movie_id, "Movie deleted");
        Ok(())
    }
}
