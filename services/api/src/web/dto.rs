//! services/api/src/web/dto.rs
//!
//! Request and response payloads of the REST API, and the validation that
//! turns a request payload into its domain input.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use cinema_core::domain::{
    HistoryEntry, MovieDraft, MovieFilter, MovieSort, MovieWithSessions, Page, Pagination,
    Registration, Role, Session, SessionKey, SortOrder, TimeSlot,
};
use cinema_core::schedule::venue_today;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Validation
//=========================================================================================

/// What validation may depend on besides the payload itself.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    /// The current calendar day at the venue.
    pub today: NaiveDate,
}

impl ValidationContext {
    pub fn at(now: DateTime<Utc>, venue_offset: FixedOffset) -> Self {
        Self {
            today: venue_today(now, venue_offset),
        }
    }
}

/// Checks a request payload and converts it into the value handlers work with.
/// The error is a client-facing message.
pub trait Validate: Sized {
    type Valid;

    fn validate(self, ctx: &ValidationContext) -> Result<Self::Valid, String>;
}

fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_ascii_punctuation())
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// 4 to 20 characters.
    pub username: String,
    /// At least 8 characters with a lowercase and an uppercase letter, a digit and a symbol.
    pub password: String,
    pub age: i32,
    #[schema(value_type = String, example = "CUSTOMER")]
    pub role: Role,
}

impl Validate for RegisterRequest {
    type Valid = Registration;

    fn validate(self, _ctx: &ValidationContext) -> Result<Registration, String> {
        let length = self.username.chars().count();
        if !(4..=20).contains(&length) {
            return Err("username must be between 4 and 20 characters".to_string());
        }
        if !is_strong_password(&self.password) {
            return Err("password is not strong enough".to_string());
        }
        if self.age < 1 {
            return Err("age must not be less than 1".to_string());
        }
        Ok(Registration {
            username: self.username,
            password: self.password,
            age: self.age,
            role: self.role,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    type Valid = Self;

    fn validate(self, _ctx: &ValidationContext) -> Result<Self, String> {
        Ok(self)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// The body of every write that returns nothing else.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResultResponse {
    pub result: String,
}

impl ResultResponse {
    pub fn success() -> Self {
        Self {
            result: "success".to_string(),
        }
    }
}

//=========================================================================================
// Movies and Sessions
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpsertRequest {
    /// `YYYY-MM-DD`, strictly after today.
    pub date: String,
    /// 0 to 6; slot `n` runs from `10 + 2n` to `12 + 2n` o'clock.
    pub time_slot: i64,
    pub room_number: i64,
}

impl SessionUpsertRequest {
    fn validate(&self, ctx: &ValidationContext) -> Result<SessionKey, String> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|_| format!("date '{}' must be an ISO date (YYYY-MM-DD)", self.date))?;
        if date <= ctx.today {
            return Err(format!("date '{}' must be in the future", self.date));
        }
        let time_slot = TimeSlot::new(self.time_slot).map_err(|e| e.to_string())?;
        let room_number = i32::try_from(self.room_number)
            .ok()
            .filter(|room| *room >= 0)
            .ok_or_else(|| "roomNumber must not be less than 0".to_string())?;

        Ok(SessionKey {
            date,
            time_slot,
            room_number,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieUpsertRequest {
    pub name: String,
    pub min_age: i64,
    pub sessions: Vec<SessionUpsertRequest>,
}

impl Validate for MovieUpsertRequest {
    type Valid = MovieDraft;

    fn validate(self, ctx: &ValidationContext) -> Result<MovieDraft, String> {
        if self.name.trim().is_empty() {
            return Err("name should not be empty".to_string());
        }
        let min_age = i32::try_from(self.min_age)
            .ok()
            .filter(|age| *age >= 0)
            .ok_or_else(|| "minAge must not be less than 0".to_string())?;
        let sessions = self
            .sessions
            .iter()
            .map(|session| session.validate(ctx))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MovieDraft {
            name: self.name,
            min_age,
            sessions,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time_slot: u8,
    pub room_number: i32,
}

impl From<Session> for SessionDto {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            date: session.date,
            time_slot: session.time_slot.index(),
            room_number: session.room_number,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieDto {
    pub id: Uuid,
    pub name: String,
    pub min_age: i32,
    pub sessions: Vec<SessionDto>,
}

impl From<MovieWithSessions> for MovieDto {
    fn from(listed: MovieWithSessions) -> Self {
        Self {
            id: listed.movie.id,
            name: listed.movie.name,
            min_age: listed.movie.min_age,
            sessions: listed.sessions.into_iter().map(SessionDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub enum SortByParam {
    #[serde(rename = "id")]
    Id,
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "min-age")]
    MinAge,
}

impl From<SortByParam> for MovieSort {
    fn from(param: SortByParam) -> Self {
        match param {
            SortByParam::Id => MovieSort::Id,
            SortByParam::Name => MovieSort::Name,
            SortByParam::MinAge => MovieSort::MinAge,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub enum OrderParam {
    #[default]
    #[serde(rename = "asc", alias = "ASC")]
    Asc,
    #[serde(rename = "desc", alias = "DESC")]
    Desc,
}

impl From<OrderParam> for SortOrder {
    fn from(param: OrderParam) -> Self {
        match param {
            OrderParam::Asc => SortOrder::Asc,
            OrderParam::Desc => SortOrder::Desc,
        }
    }
}

/// A page is requested only when both numbers are present and not negative.
fn requested_page(page_number: Option<i64>, page_size: Option<i64>) -> Result<Option<Pagination>, String> {
    match (page_number, page_size) {
        (Some(number), Some(size)) if number >= 0 && size >= 0 => {
            let page_number = u32::try_from(number).map_err(|_| "page-number is too large".to_string())?;
            let page_size = u32::try_from(size).map_err(|_| "page-size is too large".to_string())?;
            Ok(Some(Pagination {
                page_number,
                page_size,
            }))
        }
        _ => Ok(None),
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovieListQuery {
    #[serde(rename = "page-size")]
    pub page_size: Option<i64>,
    #[serde(rename = "page-number")]
    pub page_number: Option<i64>,
    /// Only movies whose minimum age is at most this. Zero or negative means no filter.
    #[serde(rename = "permitted-for-age")]
    pub permitted_for_age: Option<i32>,
    /// Case-insensitive part of the name.
    pub name: Option<String>,
    #[serde(rename = "sort-by")]
    #[param(value_type = Option<String>, example = "min-age")]
    pub sort_by: Option<SortByParam>,
    #[param(value_type = Option<String>, example = "desc")]
    pub order: Option<OrderParam>,
}

impl MovieListQuery {
    pub fn into_filter(self) -> Result<MovieFilter, String> {
        Ok(MovieFilter {
            name: self.name.filter(|n| !n.is_empty()),
            permitted_for_age: self.permitted_for_age.filter(|age| *age > 0),
            sort_by: self.sort_by.unwrap_or_default().into(),
            order: self.order.unwrap_or_default().into(),
            pagination: requested_page(self.page_number, self.page_size)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieListResponse {
    pub movies: Vec<MovieDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl From<Page<MovieWithSessions>> for MovieListResponse {
    fn from(page: Page<MovieWithSessions>) -> Self {
        Self {
            movies: page.items.into_iter().map(MovieDto::from).collect(),
            total_count: page.total_count,
            page_number: page.pagination.map(|p| p.page_number),
            page_size: page.pagination.map(|p| p.page_size),
        }
    }
}

//=========================================================================================
// Tickets and Watching
//=========================================================================================

/// Names the session a ticket or a watch is for.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub session_id: Uuid,
}

impl Validate for SessionRequest {
    type Valid = Uuid;

    fn validate(self, _ctx: &ValidationContext) -> Result<Uuid, String> {
        Ok(self.session_id)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchEntryDto {
    pub movie_id: Uuid,
    pub movie_name: String,
    /// When the movie was last watched.
    pub watched_at: DateTime<Utc>,
}

impl From<HistoryEntry> for WatchEntryDto {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            movie_id: entry.movie_id,
            movie_name: entry.movie_name,
            watched_at: entry.watched_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    #[serde(rename = "page-size")]
    pub page_size: Option<i64>,
    #[serde(rename = "page-number")]
    pub page_number: Option<i64>,
}

impl HistoryQuery {
    pub fn pagination(&self) -> Result<Option<Pagination>, String> {
        requested_page(self.page_number, self.page_size)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub history: Vec<WatchEntryDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl From<Page<HistoryEntry>> for HistoryResponse {
    fn from(page: Page<HistoryEntry>) -> Self {
        Self {
            history: page.items.into_iter().map(WatchEntryDto::from).collect(),
            total_count: page.total_count,
            page_number: page.pagination.map(|p| p.page_number),
            page_size: page.pagination.map(|p| p.page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ValidationContext {
        ValidationContext {
            today: NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(),
        }
    }

    fn register(username: &str, password: &str, age: i32) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            age,
            role: Role::Customer,
        }
    }

    fn session(date: &str, time_slot: i64, room_number: i64) -> SessionUpsertRequest {
        SessionUpsertRequest {
            date: date.to_string(),
            time_slot,
            room_number,
        }
    }

    #[test]
    fn registration_rules() {
        assert!(register("testuser", "StrongP@ssw0rd", 25).validate(&ctx()).is_ok());
        assert!(register("abc", "StrongP@ssw0rd", 25).validate(&ctx()).is_err());
        assert!(register("a_very_long_username_x", "StrongP@ssw0rd", 25).validate(&ctx()).is_err());
        assert!(register("testuser", "weakpassword", 25).validate(&ctx()).is_err());
        assert!(register("testuser", "NoSymbol123", 25).validate(&ctx()).is_err());
        assert!(register("testuser", "Sh0rt!", 25).validate(&ctx()).is_err());
        assert!(register("testuser", "StrongP@ssw0rd", 0).validate(&ctx()).is_err());
    }

    #[test]
    fn session_dates_must_be_strictly_future() {
        let key = session("2030-06-02", 2, 1).validate(&ctx()).unwrap();
        assert_eq!(key.time_slot.index(), 2);

        assert!(session("2030-06-01", 2, 1).validate(&ctx()).is_err());
        assert!(session("2030-05-31", 2, 1).validate(&ctx()).is_err());
        assert!(session("02/06/2030", 2, 1).validate(&ctx()).is_err());
    }

    #[test]
    fn session_slot_and_room_ranges() {
        assert!(session("2030-06-02", 6, 0).validate(&ctx()).is_ok());
        assert!(session("2030-06-02", 7, 0).validate(&ctx()).is_err());
        assert!(session("2030-06-02", -1, 0).validate(&ctx()).is_err());
        assert!(session("2030-06-02", 0, -1).validate(&ctx()).is_err());
    }

    #[test]
    fn movie_payload_rules() {
        let movie = |name: &str, min_age: i64| MovieUpsertRequest {
            name: name.to_string(),
            min_age,
            sessions: vec![session("2030-06-02", 2, 1)],
        };

        let draft = movie("Inception", 13).validate(&ctx()).unwrap();
        assert_eq!(draft.sessions.len(), 1);
        assert!(movie("  ", 13).validate(&ctx()).is_err());
        assert!(movie("Inception", -1).validate(&ctx()).is_err());
    }

    #[test]
    fn list_query_defaults_and_page_rules() {
        let filter = MovieListQuery::default().into_filter().unwrap();
        assert_eq!(filter.sort_by, MovieSort::Name);
        assert_eq!(filter.order, SortOrder::Asc);
        assert!(filter.pagination.is_none());

        let filter = MovieListQuery {
            page_size: Some(10),
            permitted_for_age: Some(-1),
            ..MovieListQuery::default()
        }
        .into_filter()
        .unwrap();
        assert!(filter.pagination.is_none());
        assert!(filter.permitted_for_age.is_none());

        let filter = MovieListQuery {
            page_size: Some(10),
            page_number: Some(2),
            permitted_for_age: Some(0),
            ..MovieListQuery::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.pagination.map(|p| p.offset()), Some(10));
        assert!(filter.permitted_for_age.is_none());

        let filter = MovieListQuery {
            permitted_for_age: Some(13),
            ..MovieListQuery::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.permitted_for_age, Some(13));
    }

    #[test]
    fn sort_params_use_their_wire_names() {
        let sort: SortByParam = serde_json::from_str("\"min-age\"").unwrap();
        assert_eq!(MovieSort::from(sort), MovieSort::MinAge);
        let order: OrderParam = serde_json::from_str("\"DESC\"").unwrap();
        assert_eq!(SortOrder::from(order), SortOrder::Desc);
        assert!(serde_json::from_str::<SortByParam>("\"rating\"").is_err());
    }
}
