pub mod repository;
pub mod ledger;
pub mod availability;
pub mod directory;
pub mod identity;
pub mod profile;
pub mod memory;
pub mod seed;

pub use ledger::{BookingLedger, BookingRecord, BookingRequest, BookingSummary, CancellationResult};
pub use availability::{SeatAvailability, SeatAvailabilityQuery, SeatLayout};
pub use directory::{BusSearchRequest, BusSummary, RouteDirectory};
pub use identity::{OtpIdentity, OtpSettings};
pub use profile::{ProfileService, ProfileSummary, ProfileUpdate};
pub use memory::InMemoryStore;
pub use seed::CatalogSeed;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
