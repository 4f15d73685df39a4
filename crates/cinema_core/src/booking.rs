//! crates/cinema_core/src/booking.rs
//!
//! Ticket issuance. A ticket may be bought for any session that has not yet
//! ended, by any user old enough for the movie, once per user and session.

use crate::domain::Ticket;
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{CatalogRepository, Clock, TicketRepository, UniqueConstraint};
use crate::schedule::SessionWindow;
use chrono::FixedOffset;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub struct BookingService {
    catalog: Arc<dyn CatalogRepository>,
    tickets: Arc<dyn TicketRepository>,
    clock: Arc<dyn Clock>,
    venue_offset: FixedOffset,
}

impl BookingService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        tickets: Arc<dyn TicketRepository>,
        clock: Arc<dyn Clock>,
        venue_offset: FixedOffset,
    ) -> Self {
        Self {
            catalog,
            tickets,
            clock,
            venue_offset,
        }
    }

    pub async fn issue_ticket(&self, user_id: Uuid, user_age: i32, session_id: Uuid) -> ServiceResult<Ticket> {
        let (session, movie) = self
            .catalog
            .find_session_with_movie(session_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Session not found"))?;

        if user_age < movie.min_age {
            debug!(%session_id, user_age, min_age = movie.min_age, "Ticket refused on age");
            return Err(ServiceError::bad_request("Minimum age restriction not satisfied"));
        }

        let window = SessionWindow::for_session(&session, self.venue_offset);
        if window.is_expired(self.clock.now()) {
            debug!(%session_id, "Ticket refused for expired session");
            return Err(ServiceError::bad_request("Session is expired"));
        }

        let ticket = self
            .tickets
            .insert_ticket(session.id, user_id)
            .await
            .map_err(ServiceError::conflict_on(
                UniqueConstraint::TicketPerUser,
                "Ticket already booked for session",
            ))?;

        info!(ticket_id = %ticket.id, %session_id, %user_id, "Ticket issued");
        Ok(ticket)
    }
}
