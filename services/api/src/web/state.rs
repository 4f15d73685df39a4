//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and how it is wired from adapters.

use chrono::FixedOffset;
use cinema_core::ports::{
    CatalogRepository, Clock, CredentialHasher, HistoryRepository, TicketRepository, TokenSigner,
    UserRepository,
};
use cinema_core::{AccessGate, BookingService, CatalogService, IdentityService, WatchService};
use std::sync::Arc;

/// The concrete port implementations the services are built on.
pub struct Adapters {
    pub users: Arc<dyn UserRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub history: Arc<dyn HistoryRepository>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub signer: Arc<dyn TokenSigner>,
    pub clock: Arc<dyn Clock>,
}

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub identity: IdentityService,
    pub catalog: CatalogService,
    pub booking: BookingService,
    pub watch: WatchService,
    pub gate: AccessGate,
    pub clock: Arc<dyn Clock>,
    pub venue_offset: FixedOffset,
}

impl AppState {
    pub fn new(adapters: Adapters, venue_offset: FixedOffset) -> Self {
        let Adapters {
            users,
            catalog,
            tickets,
            history,
            hasher,
            signer,
            clock,
        } = adapters;

        Self {
            identity: IdentityService::new(users, hasher, signer.clone(), clock.clone()),
            booking: BookingService::new(catalog.clone(), tickets.clone(), clock.clone(), venue_offset),
            watch: WatchService::new(tickets, history, clock.clone(), venue_offset),
            catalog: CatalogService::new(catalog),
            gate: AccessGate::new(signer),
            clock,
            venue_offset,
        }
    }
}
