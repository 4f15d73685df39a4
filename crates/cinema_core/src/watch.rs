//! crates/cinema_core/src/watch.rs
//!
//! Recording watches against booked sessions and reading back the history.

use crate::domain::{HistoryEntry, Page, Pagination};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{Clock, HistoryRepository, TicketRepository};
use crate::schedule::SessionWindow;
use chrono::FixedOffset;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub struct WatchService {
    tickets: Arc<dyn TicketRepository>,
    history: Arc<dyn HistoryRepository>,
    clock: Arc<dyn Clock>,
    venue_offset: FixedOffset,
}

impl WatchService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        history: Arc<dyn HistoryRepository>,
        clock: Arc<dyn Clock>,
        venue_offset: FixedOffset,
    ) -> Self {
        Self {
            tickets,
            history,
            clock,
            venue_offset,
        }
    }

    /// Records that the user is watching the session now. Requires a ticket
    /// and a running session; only the latest watch per movie is kept.
    pub async fn record_watch(&self, user_id: Uuid, session_id: Uuid) -> ServiceResult<HistoryEntry> {
        let booked = self
            .tickets
            .find_booked_session(user_id, session_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Ticket not found"))?;

        let now = self.clock.now();
        if !SessionWindow::for_session(&booked.session, self.venue_offset).is_active(now) {
            debug!(%session_id, %user_id, "Watch refused outside the session window");
            return Err(ServiceError::bad_request("Session is not active"));
        }

        let record = self.history.upsert_watch(booked.movie.id, user_id, now).await?;
        info!(movie_id = %record.movie_id, %user_id, "Watch recorded");

        Ok(HistoryEntry {
            movie_id: record.movie_id,
            movie_name: booked.movie.name,
            watched_at: record.watched_at,
        })
    }

    pub async fn list_history(
        &self,
        user_id: Uuid,
        pagination: Option<Pagination>,
    ) -> ServiceResult<Page<HistoryEntry>> {
        let (entries, total_count) = self.history.list_history(user_id, pagination).await?;
        Ok(Page::new(entries, total_count, pagination))
    }
}
