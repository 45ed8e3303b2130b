use std::collections::HashSet;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;
use busly_shared::{Booking, Bus, City, Otp, Seat, User};
use crate::seed::CatalogSeed;
use crate::CoreResult;

/// Read access to cities, buses and the per-bus seat catalog
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_cities(&self) -> CoreResult<Vec<City>>;

    async fn get_city(&self, id: Uuid) -> CoreResult<Option<City>>;

    async fn get_bus(&self, id: Uuid) -> CoreResult<Option<Bus>>;

    /// Buses on a route. With a date, only buses with an active trip that day.
    async fn find_buses(
        &self,
        from_city_id: Uuid,
        to_city_id: Uuid,
        service_date: Option<NaiveDate>,
    ) -> CoreResult<Vec<Bus>>;

    async fn seats_for_bus(&self, bus_id: Uuid) -> CoreResult<Vec<Seat>>;

    /// Loads reference data. Skipped when the catalog already has cities.
    async fn load_catalog(&self, seed: &CatalogSeed) -> CoreResult<()>;
}

/// Booking and seat-reservation storage. Only the booking ledger writes here.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persists the booking and one reservation per seat as a single unit.
    /// Fails with `Conflict` if any seat is already held for the booking's
    /// bus and travel date; nothing is written in that case.
    async fn insert_booking(&self, booking: &Booking, seats: &[Seat]) -> CoreResult<()>;

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    /// Newest first.
    async fn list_bookings_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>>;

    /// Seats currently reserved by the booking.
    async fn seats_for_booking(&self, booking_id: Uuid) -> CoreResult<Vec<Seat>>;

    /// Seat ids held by confirmed bookings for the bus on that date.
    async fn held_seat_ids(&self, bus_id: Uuid, travel_date: NaiveDate) -> CoreResult<HashSet<Uuid>>;

    /// Deletes the reservations and marks the booking CANCELLED atomically.
    /// Returns false when the booking was not CONFIRMED anymore.
    async fn cancel_booking(&self, booking_id: Uuid) -> CoreResult<bool>;
}

/// Users and the OTP codes that log them in
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>>;

    async fn find_user_by_phone(&self, phone: &str) -> CoreResult<Option<User>>;

    /// Fails with `Conflict` if the phone is taken.
    async fn create_user(&self, user: &User) -> CoreResult<()>;

    async fn update_user(&self, user: &User) -> CoreResult<()>;

    async fn create_otp(&self, otp: &Otp) -> CoreResult<()>;

    async fn get_otp(&self, id: Uuid) -> CoreResult<Option<Otp>>;

    /// Marks the code used. Returns false if it was already used.
    async fn consume_otp(&self, id: Uuid) -> CoreResult<bool>;
}
