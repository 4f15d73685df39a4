pub mod access;
pub mod booking;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod identity;
#[cfg(feature = "test-utils")]
pub mod memory;
pub mod ports;
pub mod schedule;
pub mod watch;

pub use access::AccessGate;
pub use booking::BookingService;
pub use catalog::CatalogService;
pub use domain::{
    BookedSession, Claims, HistoryEntry, Movie, MovieDraft, MovieFilter, MovieSort,
    MovieWithSessions, Page, Pagination, Registration, Role, Session, SessionKey, SortOrder,
    Ticket, TimeSlot, User,
};
pub use error::{ServiceError, ServiceResult};
pub use identity::IdentityService;
pub use ports::{
    CatalogRepository, Clock, CredentialHasher, HistoryRepository, PortError, PortResult,
    SystemClock, TicketRepository, TokenSigner, UserRepository,
};
pub use watch::WatchService;
