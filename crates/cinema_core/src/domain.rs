//! crates/cinema_core/src/domain.rs
//!
//! Defines the pure, core data structures for the booking backend.
//! These structs are independent of any database or wire format; the only
//! serialized type is `Claims`, which travels inside the signed token.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Users and Roles
//=========================================================================================

/// The role carried by a user and by every token issued to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Manager => "MANAGER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(Role::Customer),
            "MANAGER" => Ok(Role::Manager),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A registered user, including the stored credential material.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_digest: String,
    pub salt: String,
    pub age: i32,
    pub role: Role,
}

/// Everything needed to persist a new user. The password is already digested.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_digest: String,
    pub salt: String,
    pub age: i32,
    pub role: Role,
}

/// Registration input as received from a client, password in clear.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub age: i32,
    pub role: Role,
}

/// The identity attributes asserted by a signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user id.
    pub sub: Uuid,
    pub username: String,
    pub age: i32,
    pub role: Role,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

//=========================================================================================
// Catalog: Movies and Sessions
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    pub id: Uuid,
    pub name: String,
    pub min_age: i32,
}

/// One of the seven fixed two-hour exhibition windows of a day.
///
/// Slot `n` starts at `10 + 2n` o'clock, so slot 0 is 10:00-12:00 and slot 6
/// is 22:00-24:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeSlot(u8);

#[derive(Debug, thiserror::Error)]
#[error("Time slot must be between 0 and 6, got {0}")]
pub struct InvalidTimeSlot(pub i64);

impl TimeSlot {
    pub const COUNT: u8 = 7;
    const FIRST_START_HOUR: u32 = 10;
    pub const LENGTH_HOURS: u32 = 2;

    pub fn new(value: i64) -> Result<Self, InvalidTimeSlot> {
        if (0..i64::from(Self::COUNT)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(InvalidTimeSlot(value))
        }
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn start_hour(&self) -> u32 {
        Self::FIRST_START_HOUR + Self::LENGTH_HOURS * u32::from(self.0)
    }

    pub fn end_hour(&self) -> u32 {
        self.start_hour() + Self::LENGTH_HOURS
    }
}

/// The composite key that makes a session unique within the whole catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub room_number: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub room_number: i32,
}

impl Session {
    pub fn key(&self) -> SessionKey {
        SessionKey {
            date: self.date,
            time_slot: self.time_slot,
            room_number: self.room_number,
        }
    }
}

/// A movie loaded together with all of its sessions.
#[derive(Debug, Clone)]
pub struct MovieWithSessions {
    pub movie: Movie,
    pub sessions: Vec<Session>,
}

/// Input for creating or replacing a movie and its schedule.
#[derive(Debug, Clone)]
pub struct MovieDraft {
    pub name: String,
    pub min_age: i32,
    pub sessions: Vec<SessionKey>,
}

//=========================================================================================
// Booking: Tickets and Watch History
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
}

/// A ticket joined to the session it admits to and that session's movie.
#[derive(Debug, Clone)]
pub struct BookedSession {
    pub ticket: Ticket,
    pub session: Session,
    pub movie: Movie,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchHistory {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub user_id: Uuid,
    pub watched_at: DateTime<Utc>,
}

/// One line of a user's watch history, with the movie name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub movie_id: Uuid,
    pub movie_name: String,
    pub watched_at: DateTime<Utc>,
}

//=========================================================================================
// Listing: Filters, Sorting, Pagination
//=========================================================================================

/// A 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_number: u32,
    pub page_size: u32,
}

impl Pagination {
    /// Number of rows to skip. Page numbers below 1 are treated as the first page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

/// A list result. `total_count` is only known when a page was requested.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: Option<u64>,
    pub pagination: Option<Pagination>,
}

impl<T> Page<T> {
    /// Builds a page, dropping the total count when no pagination was requested.
    pub fn new(items: Vec<T>, total_count: u64, pagination: Option<Pagination>) -> Self {
        Self {
            items,
            total_count: pagination.map(|_| total_count),
            pagination,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovieSort {
    Id,
    #[default]
    Name,
    MinAge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    /// Case-insensitive substring of the movie name.
    pub name: Option<String>,
    /// Keep only movies whose minimum age is at most this value. Zero or less
    /// is treated as absent.
    pub permitted_for_age: Option<i32>,
    pub sort_by: MovieSort,
    pub order: SortOrder,
    pub pagination: Option<Pagination>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_slots_cover_ten_to_midnight() {
        let first = TimeSlot::new(0).unwrap();
        let last = TimeSlot::new(6).unwrap();
        assert_eq!((first.start_hour(), first.end_hour()), (10, 12));
        assert_eq!((last.start_hour(), last.end_hour()), (22, 24));
        assert!(TimeSlot::new(7).is_err());
        assert!(TimeSlot::new(-1).is_err());
    }

    #[test]
    fn role_parses_its_own_representation() {
        for role in [Role::Customer, Role::Manager] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("ADMIN".parse::<Role>().is_err());
    }

    #[test]
    fn page_keeps_count_only_when_paginated() {
        let unpaged = Page::new(vec![1, 2], 2, None);
        assert_eq!(unpaged.total_count, None);

        let paged = Page::new(
            vec![3],
            11,
            Some(Pagination {
                page_number: 3,
                page_size: 5,
            }),
        );
        assert_eq!(paged.total_count, Some(11));
        assert_eq!(paged.pagination.map(|p| p.offset()), Some(10));
    }
}
