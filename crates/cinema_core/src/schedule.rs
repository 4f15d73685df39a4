//! crates/cinema_core/src/schedule.rs
//!
//! Wall-clock math for sessions. A session's phase is never stored; it is
//! recomputed from the current instant on every request.

use crate::domain::{Session, TimeSlot};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// Where a session stands relative to a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Upcoming,
    Active,
    Expired,
}

/// The half-open interval `[start, end)` during which a session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SessionWindow {
    /// Window of `time_slot` on `date`, where both are read in the venue's offset.
    pub fn new(date: NaiveDate, time_slot: TimeSlot, venue_offset: FixedOffset) -> Self {
        let local_start =
            date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(time_slot.start_hour()));
        let utc_start = local_start - Duration::seconds(i64::from(venue_offset.local_minus_utc()));
        let start = Utc.from_utc_datetime(&utc_start);

        Self {
            start,
            end: start + Duration::hours(i64::from(TimeSlot::LENGTH_HOURS)),
        }
    }

    pub fn for_session(session: &Session, venue_offset: FixedOffset) -> Self {
        Self::new(session.date, session.time_slot, venue_offset)
    }

    pub fn phase_at(&self, now: DateTime<Utc>) -> SessionPhase {
        if now < self.start {
            SessionPhase::Upcoming
        } else if now < self.end {
            SessionPhase::Active
        } else {
            SessionPhase::Expired
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.phase_at(now) == SessionPhase::Active
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.phase_at(now) == SessionPhase::Expired
    }
}

/// The calendar date at `now` in the venue's offset.
pub fn venue_today(now: DateTime<Utc>, venue_offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&venue_offset).date_naive()
}
