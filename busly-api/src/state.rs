use std::sync::Arc;
use busly_core::repository::{BookingRepository, CatalogRepository, UserRepository};
use busly_core::{
    BookingLedger, OtpIdentity, OtpSettings, ProfileService, RouteDirectory, SeatAvailabilityQuery,
};
use busly_store::app_config::Config;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub ledger: BookingLedger,
    pub seats: SeatAvailabilityQuery,
    pub directory: RouteDirectory,
    pub identity: OtpIdentity,
    pub profiles: ProfileService,
    pub auth: AuthConfig,
}

impl AppState {
    /// Wires every service over the given repositories.
    pub fn new(
        config: &Config,
        catalog: Arc<dyn CatalogRepository>,
        bookings: Arc<dyn BookingRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        let directory = RouteDirectory::new(catalog);
        let settings = OtpSettings {
            ttl_seconds: config.auth.otp_ttl_seconds,
            length: config.auth.otp_length,
        };

        Self {
            ledger: BookingLedger::new(bookings.clone(), directory.clone()),
            seats: SeatAvailabilityQuery::new(directory.clone(), bookings.clone()),
            identity: OtpIdentity::new(users.clone(), settings),
            profiles: ProfileService::new(users, bookings, config.business_rules.wallet_credit_per_booking),
            directory,
            auth: AuthConfig {
                secret: config.auth.jwt_secret.clone(),
                expiration: config.auth.jwt_expiration_seconds,
            },
        }
    }
}
