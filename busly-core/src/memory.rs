use std::collections::{HashMap, HashSet};
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;
use busly_shared::{Booking, BookingSeat, BookingStatus, Bus, City, Otp, Seat, Trip, TripStatus, User};
use crate::repository::{BookingRepository, CatalogRepository, UserRepository};
use crate::seed::CatalogSeed;
use crate::{CoreError, CoreResult};

#[derive(Default)]
struct Tables {
    cities: HashMap<Uuid, City>,
    buses: HashMap<Uuid, Bus>,
    trips: Vec<Trip>,
    seats: HashMap<Uuid, Seat>,
    bookings: HashMap<Uuid, Booking>,
    booking_seats: Vec<BookingSeat>,
    users: HashMap<Uuid, User>,
    otps: HashMap<Uuid, Otp>,
}

impl Tables {
    fn is_held(&self, bus_id: Uuid, travel_date: NaiveDate, seat_id: Uuid) -> bool {
        self.booking_seats.iter().any(|bs| {
            bs.bus_id == bus_id
                && bs.travel_date == travel_date
                && bs.seat_id == seat_id
                && self.bookings.get(&bs.booking_id).is_some_and(|b| b.status.is_active())
        })
    }
}

/// Process-local store for development and tests. One lock guards every
/// table, so a booking's availability check and insert cannot interleave
/// with another booking.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_city(&self, city: City) {
        self.tables.write().await.cities.insert(city.id, city);
    }

    pub async fn add_bus(&self, bus: Bus) {
        self.tables.write().await.buses.insert(bus.id, bus);
    }

    pub async fn add_seat(&self, seat: Seat) {
        self.tables.write().await.seats.insert(seat.id, seat);
    }

    /// Replaces any trip already scheduled for the same bus and date.
    pub async fn add_trip(&self, trip: Trip) {
        let mut tables = self.tables.write().await;
        tables.trips.retain(|t| !(t.bus_id == trip.bus_id && t.service_date == trip.service_date));
        tables.trips.push(trip);
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn list_cities(&self) -> CoreResult<Vec<City>> {
        Ok(self.tables.read().await.cities.values().cloned().collect())
    }

    async fn get_city(&self, id: Uuid) -> CoreResult<Option<City>> {
        Ok(self.tables.read().await.cities.get(&id).cloned())
    }

    async fn get_bus(&self, id: Uuid) -> CoreResult<Option<Bus>> {
        Ok(self.tables.read().await.buses.get(&id).cloned())
    }

    async fn find_buses(
        &self,
        from_city_id: Uuid,
        to_city_id: Uuid,
        service_date: Option<NaiveDate>,
    ) -> CoreResult<Vec<Bus>> {
        let tables = self.tables.read().await;
        let buses = tables
            .buses
            .values()
            .filter(|b| b.from_city_id == from_city_id && b.to_city_id == to_city_id)
            .filter(|b| match service_date {
                Some(date) => tables.trips.iter().any(|t| {
                    t.bus_id == b.id && t.service_date == date && t.status == TripStatus::Active
                }),
                None => true,
            })
            .cloned()
            .collect();
        Ok(buses)
    }

    async fn seats_for_bus(&self, bus_id: Uuid) -> CoreResult<Vec<Seat>> {
        let tables = self.tables.read().await;
        Ok(tables.seats.values().filter(|s| s.bus_id == bus_id).cloned().collect())
    }

    async fn load_catalog(&self, seed: &CatalogSeed) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.cities.is_empty() {
            tracing::info!("Catalog already populated, skipping seed");
            return Ok(());
        }
        tables.cities.extend(seed.cities.iter().map(|c| (c.id, c.clone())));
        tables.buses.extend(seed.buses.iter().map(|b| (b.id, b.clone())));
        tables.seats.extend(seed.seats.iter().map(|s| (s.id, s.clone())));
        tables.trips.extend(seed.trips.iter().cloned());
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert_booking(&self, booking: &Booking, seats: &[Seat]) -> CoreResult<()> {
        let mut tables = self.tables.write().await;

        for seat in seats {
            if seat.bus_id != booking.bus_id {
                return Err(CoreError::InvalidRequest(format!(
                    "Seat {} does not belong to bus {}",
                    seat.seat_no, booking.bus_id
                )));
            }
            if tables.is_held(booking.bus_id, booking.travel_date, seat.id) {
                return Err(CoreError::Conflict(format!(
                    "Seat {} is already booked for {}",
                    seat.seat_no, booking.travel_date
                )));
            }
        }

        tables.bookings.insert(booking.id, booking.clone());
        for seat in seats {
            tables.booking_seats.push(BookingSeat::new(booking, seat.id));
        }
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables.bookings.values().filter(|b| b.user_id == user_id).cloned().collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(bookings)
    }

    async fn seats_for_booking(&self, booking_id: Uuid) -> CoreResult<Vec<Seat>> {
        let tables = self.tables.read().await;
        Ok(tables
            .booking_seats
            .iter()
            .filter(|bs| bs.booking_id == booking_id)
            .filter_map(|bs| tables.seats.get(&bs.seat_id).cloned())
            .collect())
    }

    async fn held_seat_ids(&self, bus_id: Uuid, travel_date: NaiveDate) -> CoreResult<HashSet<Uuid>> {
        let tables = self.tables.read().await;
        Ok(tables
            .booking_seats
            .iter()
            .filter(|bs| bs.bus_id == bus_id && bs.travel_date == travel_date)
            .filter(|bs| tables.bookings.get(&bs.booking_id).is_some_and(|b| b.status.is_active()))
            .map(|bs| bs.seat_id)
            .collect())
    }

    async fn cancel_booking(&self, booking_id: Uuid) -> CoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.bookings.get_mut(&booking_id) {
            Some(booking) if booking.status == BookingStatus::Confirmed => {
                booking.status = BookingStatus::Cancelled;
            }
            _ => return Ok(false),
        }
        tables.booking_seats.retain(|bs| bs.booking_id != booking_id);
        Ok(true)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_phone(&self, phone: &str) -> CoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.phone == phone).cloned())
    }

    async fn create_user(&self, user: &User) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.phone == user.phone) {
            return Err(CoreError::Conflict("Phone number already registered".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &user.email {
            if tables.users.values().any(|u| u.id != user.id && u.email.as_ref() == Some(email)) {
                return Err(CoreError::Conflict("Email already in use".to_string()));
            }
        }
        match tables.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound("User not found".to_string())),
        }
    }

    async fn create_otp(&self, otp: &Otp) -> CoreResult<()> {
        self.tables.write().await.otps.insert(otp.id, otp.clone());
        Ok(())
    }

    async fn get_otp(&self, id: Uuid) -> CoreResult<Option<Otp>> {
        Ok(self.tables.read().await.otps.get(&id).cloned())
    }

    async fn consume_otp(&self, id: Uuid) -> CoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.otps.get_mut(&id) {
            Some(otp) if !otp.is_used => {
                otp.is_used = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_cancel_frees_seats_and_is_terminal() {
        let store = InMemoryStore::new();
        let bus_id = Uuid::new_v4();
        let seat = Seat {
            id: Uuid::new_v4(),
            bus_id,
            seat_no: "A1".to_string(),
            seat_type: "Seater".to_string(),
            price: 50000,
        };
        store.add_seat(seat.clone()).await;

        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            bus_id,
            travel_date: date,
            status: BookingStatus::Confirmed,
            amount: 50000,
            created_at: Utc::now(),
        };
        store.insert_booking(&booking, &[seat.clone()]).await.unwrap();
        assert!(store.held_seat_ids(bus_id, date).await.unwrap().contains(&seat.id));

        assert!(store.cancel_booking(booking.id).await.unwrap());
        assert!(store.held_seat_ids(bus_id, date).await.unwrap().is_empty());
        assert!(store.seats_for_booking(booking.id).await.unwrap().is_empty());
        assert!(!store.cancel_booking(booking.id).await.unwrap());
        assert_eq!(store.get_booking(booking.id).await.unwrap().unwrap().status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_rejects_seat_from_other_bus() {
        let store = InMemoryStore::new();
        let seat = Seat {
            id: Uuid::new_v4(),
            bus_id: Uuid::new_v4(),
            seat_no: "A1".to_string(),
            seat_type: "Seater".to_string(),
            price: 50000,
        };
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            bus_id: Uuid::new_v4(),
            travel_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            status: BookingStatus::Confirmed,
            amount: 50000,
            created_at: Utc::now(),
        };
        let result = store.insert_booking(&booking, &[seat]).await;
        assert!(matches!(result, Err(CoreError::InvalidRequest(_))));
        assert!(store.get_booking(booking.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_phone_is_unique() {
        let store = InMemoryStore::new();
        store.create_user(&User::new("+91", "+911234567890")).await.unwrap();
        let dup = store.create_user(&User::new("+91", "+911234567890")).await;
        assert!(matches!(dup, Err(CoreError::Conflict(_))));
    }
}
