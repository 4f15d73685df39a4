//! Shared fixtures: services wired to one in-memory store and a manual clock.

#![allow(dead_code)]

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use cinema_core::domain::{Claims, MovieDraft, NewUser, Role, SessionKey, TimeSlot, User};
use cinema_core::memory::{ManualClock, MemoryStore};
use cinema_core::ports::{Clock, CredentialHasher, PortError, PortResult, TokenSigner, UserRepository};
use cinema_core::{AccessGate, BookingService, CatalogService, IdentityService, WatchService};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Reversible stand-in for a real digest; good enough to tell passwords apart.
pub struct PlainHasher {
    counter: AtomicU64,
}

impl CredentialHasher for PlainHasher {
    fn generate_salt(&self) -> String {
        format!("salt-{}", self.counter.fetch_add(1, Ordering::Relaxed))
    }

    fn digest(&self, password: &str, salt: &str) -> PortResult<String> {
        Ok(format!("{}${}", salt, password.chars().rev().collect::<String>()))
    }
}

/// Unsigned JSON "tokens" that still honour expiry against the test clock.
pub struct JsonSigner {
    clock: Arc<ManualClock>,
}

impl TokenSigner for JsonSigner {
    fn sign(&self, claims: &Claims) -> PortResult<String> {
        serde_json::to_string(claims)
            .map(|json| format!("json.{}", json))
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    fn verify(&self, token: &str) -> PortResult<Claims> {
        let json = token
            .strip_prefix("json.")
            .ok_or_else(|| PortError::Unauthorized("malformed token".to_string()))?;
        let claims: Claims =
            serde_json::from_str(json).map_err(|e| PortError::Unauthorized(e.to_string()))?;
        if claims.exp <= self.clock.now().timestamp() {
            return Err(PortError::Unauthorized("token expired".to_string()));
        }
        Ok(claims)
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn key(date: NaiveDate, slot: i64, room: i32) -> SessionKey {
    SessionKey {
        date,
        time_slot: TimeSlot::new(slot).unwrap(),
        room_number: room,
    }
}

pub fn draft(name: &str, min_age: i32, sessions: Vec<SessionKey>) -> MovieDraft {
    MovieDraft {
        name: name.to_string(),
        min_age,
        sessions,
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub catalog: CatalogService,
    pub booking: BookingService,
    pub watch: WatchService,
    pub identity: IdentityService,
    pub gate: AccessGate,
}

impl Harness {
    /// Everything runs in UTC, starting at 2030-06-01 09:00.
    pub fn new() -> Self {
        Self::starting_at(at(2030, 6, 1, 9, 0))
    }

    pub fn starting_at(now: DateTime<Utc>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(now));
        let offset = FixedOffset::east_opt(0).unwrap();
        let signer = Arc::new(JsonSigner {
            clock: clock.clone(),
        });
        let hasher = Arc::new(PlainHasher {
            counter: AtomicU64::new(0),
        });

        Self {
            catalog: CatalogService::new(store.clone()),
            booking: BookingService::new(store.clone(), store.clone(), clock.clone(), offset),
            watch: WatchService::new(store.clone(), store.clone(), clock.clone(), offset),
            identity: IdentityService::new(store.clone(), hasher, signer.clone(), clock.clone()),
            gate: AccessGate::new(signer),
            store,
            clock,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Inserts a user straight into the store.
    pub async fn user(&self, username: &str, age: i32) -> User {
        self.store
            .create_user(NewUser {
                username: username.to_string(),
                password_digest: "unused".to_string(),
                salt: "unused".to_string(),
                age,
                role: Role::Customer,
            })
            .await
            .unwrap()
    }
}
