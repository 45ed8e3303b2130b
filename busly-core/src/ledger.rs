use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use busly_shared::{Booking, BookingStatus, Seat};
use busly_shared::models::catalog::natural_key;
use crate::directory::RouteDirectory;
use crate::repository::BookingRepository;
use crate::{CoreError, CoreResult};

const NOT_FOUND_OR_FORBIDDEN: &str = "Booking not found or you don't have permission to cancel it";

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub bus_id: String,
    pub travel_date: NaiveDate,
    pub seats: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingRecord {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub amount: i64,
    pub seats: Vec<String>,
    pub bus_id: Uuid,
    pub travel_date: NaiveDate,
    pub bus_name: String,
    pub from_city: String,
    pub to_city: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    pub booking_id: Uuid,
    pub bus_name: String,
    pub from_city: String,
    pub to_city: String,
    pub travel_date: NaiveDate,
    pub seats: Vec<String>,
    pub status: BookingStatus,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancellationResult {
    pub message: String,
    pub booking_id: Uuid,
    pub status: BookingStatus,
}

/// Owns every write to bookings and their seat reservations.
///
/// A seat is held for a (bus, travel date) exactly while a confirmed booking
/// has a reservation row for it. The repository enforces at most one such row
/// per (bus, date, seat) and reports a losing concurrent insert as `Conflict`.
#[derive(Clone)]
pub struct BookingLedger {
    bookings: Arc<dyn BookingRepository>,
    directory: RouteDirectory,
}

impl BookingLedger {
    pub fn new(bookings: Arc<dyn BookingRepository>, directory: RouteDirectory) -> Self {
        Self { bookings, directory }
    }

    pub async fn create_booking(&self, user_id: Uuid, req: &BookingRequest) -> CoreResult<BookingRecord> {
        // 1. Validate request shape
        if req.seats.is_empty() {
            return Err(CoreError::InvalidRequest("At least one seat must be selected".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = req.seats.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(CoreError::InvalidRequest(format!("Seat {} requested more than once", dup)));
        }

        let bus_id = Uuid::parse_str(&req.bus_id)
            .map_err(|_| CoreError::InvalidRequest("Invalid bus ID format".to_string()))?;

        // 2. Resolve bus
        let bus = self.directory.bus(bus_id).await?
            .ok_or_else(|| CoreError::NotFound("Bus not found".to_string()))?;

        // 3. Resolve every seat against this bus's catalog
        let catalog = self.directory.seats_for_bus(bus_id).await?;
        let by_number: HashMap<&str, &Seat> = catalog.iter().map(|s| (s.seat_no.as_str(), s)).collect();

        let mut chosen = Vec::with_capacity(req.seats.len());
        for seat_no in &req.seats {
            let seat = by_number
                .get(seat_no.as_str())
                .ok_or_else(|| CoreError::NotFound(format!("Seat {} not found", seat_no)))?;
            chosen.push((*seat).clone());
        }

        // 4. Price is captured now and never recomputed
        let amount: i64 = chosen.iter().map(|s| s.price).sum();

        let booking = Booking {
            id: Uuid::new_v4(),
            user_id,
            bus_id,
            travel_date: req.travel_date,
            status: BookingStatus::Confirmed,
            amount,
            created_at: Utc::now(),
        };

        // 5. Single unit of work; Conflict if a seat was taken meanwhile
        self.bookings.insert_booking(&booking, &chosen).await?;

        info!(
            "Booking {} confirmed for user {}: bus {} on {} seats {:?} amount {}",
            booking.id, user_id, bus_id, booking.travel_date, req.seats, amount
        );

        let (from_city, to_city) = self.directory.route_names(&bus).await;

        Ok(BookingRecord {
            booking_id: booking.id,
            status: booking.status,
            amount,
            seats: req.seats.clone(),
            bus_id,
            travel_date: booking.travel_date,
            bus_name: bus.operator,
            from_city,
            to_city,
        })
    }

    /// All bookings of the user, newest first. Degrades to an empty list when
    /// storage is unreadable.
    pub async fn get_user_bookings(&self, user_id: Uuid) -> Vec<BookingSummary> {
        match self.try_user_bookings(user_id).await {
            Ok(list) => list,
            Err(e) => {
                warn!("Failed to fetch bookings for user {}: {}", user_id, e);
                Vec::new()
            }
        }
    }

    async fn try_user_bookings(&self, user_id: Uuid) -> CoreResult<Vec<BookingSummary>> {
        let mut bookings = self.bookings.list_bookings_for_user(user_id).await?;
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let mut summaries = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let bus = match self.directory.bus(booking.bus_id).await? {
                Some(bus) => bus,
                None => {
                    warn!("Booking {} references missing bus {}", booking.id, booking.bus_id);
                    continue;
                }
            };
            let (from_city, to_city) = self.directory.route_names(&bus).await;

            let mut seats = self.bookings.seats_for_booking(booking.id).await?;
            seats.sort_by_key(|s| s.natural_key());

            summaries.push(BookingSummary {
                booking_id: booking.id,
                bus_name: bus.operator,
                from_city,
                to_city,
                travel_date: booking.travel_date,
                seats: seats.into_iter().map(|s| s.seat_no).collect(),
                status: booking.status,
                amount: booking.amount,
            });
        }

        Ok(summaries)
    }

    /// Cancels a booking owned by `user_id`. A missing booking and someone
    /// else's booking produce the same `NotFound`.
    pub async fn cancel_booking(&self, booking_id: &str, user_id: Uuid) -> CoreResult<CancellationResult> {
        let booking_id = Uuid::parse_str(booking_id)
            .map_err(|_| CoreError::NotFound(NOT_FOUND_OR_FORBIDDEN.to_string()))?;

        let booking = match self.bookings.get_booking(booking_id).await? {
            Some(b) if b.user_id == user_id => b,
            _ => return Err(CoreError::NotFound(NOT_FOUND_OR_FORBIDDEN.to_string())),
        };

        if booking.status == BookingStatus::Cancelled {
            return Err(CoreError::InvalidState("Booking is already cancelled".to_string()));
        }

        let held = self.bookings.seats_for_booking(booking_id).await?;
        if held.is_empty() {
            return Err(CoreError::NotFound("No seats found for this booking".to_string()));
        }

        // A concurrent cancel may have won between the read and this write
        if !self.bookings.cancel_booking(booking_id).await? {
            return Err(CoreError::InvalidState("Booking is already cancelled".to_string()));
        }

        let mut released: Vec<&str> = held.iter().map(|s| s.seat_no.as_str()).collect();
        released.sort_by_key(|s| natural_key(s));
        info!(
            "Booking {} cancelled by user {}; released seats {:?} on bus {} for {}",
            booking_id, user_id, released, booking.bus_id, booking.travel_date
        );

        Ok(CancellationResult {
            message: "Booking cancelled successfully".to_string(),
            booking_id,
            status: BookingStatus::Cancelled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::SeatAvailabilityQuery;
    use crate::memory::InMemoryStore;
    use busly_shared::{Bus, City};

    struct Fixture {
        store: Arc<InMemoryStore>,
        ledger: BookingLedger,
        seats: SeatAvailabilityQuery,
        bus: Bus,
    }

    async fn fixture(seats: &[(&str, i64)]) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let from = City { id: Uuid::new_v4(), name: "Bangalore".to_string(), state: None };
        let to = City { id: Uuid::new_v4(), name: "Hyderabad".to_string(), state: None };
        store.add_city(from.clone()).await;
        store.add_city(to.clone()).await;

        let bus = Bus {
            id: Uuid::new_v4(),
            operator: "VRL Travels".to_string(),
            from_city_id: from.id,
            to_city_id: to.id,
            departure_time: "21:00".to_string(),
            arrival_time: "06:00".to_string(),
            duration: Some("9h".to_string()),
            fare: 90000,
            rating: Some(4.3),
        };
        store.add_bus(bus.clone()).await;
        for (no, price) in seats {
            store.add_seat(Seat {
                id: Uuid::new_v4(),
                bus_id: bus.id,
                seat_no: no.to_string(),
                seat_type: "Sleeper".to_string(),
                price: *price,
            }).await;
        }

        let directory = RouteDirectory::new(store.clone());
        Fixture {
            ledger: BookingLedger::new(store.clone(), directory.clone()),
            seats: SeatAvailabilityQuery::new(directory, store.clone()),
            store,
            bus,
        }
    }

    fn request(bus: &Bus, date: NaiveDate, seats: &[&str]) -> BookingRequest {
        BookingRequest {
            bus_id: bus.id.to_string(),
            travel_date: date,
            seats: seats.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    fn unavailable(layout: &crate::availability::SeatLayout) -> Vec<String> {
        layout.seats.iter().filter(|s| !s.is_available).map(|s| s.seat_no.clone()).collect()
    }

    #[tokio::test]
    async fn test_book_and_cancel_round_trip() {
        let fx = fixture(&[("A1", 50000), ("A2", 60000)]).await;
        let user = Uuid::new_v4();

        let record = fx.ledger.create_booking(user, &request(&fx.bus, day(1), &["A1", "A2"])).await.unwrap();
        assert_eq!(record.amount, 110000);
        assert_eq!(record.status, BookingStatus::Confirmed);
        assert_eq!(record.bus_name, "VRL Travels");
        assert_eq!(record.from_city, "Bangalore");
        assert_eq!(record.to_city, "Hyderabad");

        let layout = fx.seats.seat_layout(&fx.bus.id.to_string(), Some(day(1))).await;
        assert_eq!(unavailable(&layout), vec!["A1", "A2"]);

        let result = fx.ledger.cancel_booking(&record.booking_id.to_string(), user).await.unwrap();
        assert_eq!(result.status, BookingStatus::Cancelled);

        let layout = fx.seats.seat_layout(&fx.bus.id.to_string(), Some(day(1))).await;
        assert!(layout.seats.iter().all(|s| s.is_available));
    }

    #[tokio::test]
    async fn test_amount_is_sum_of_chosen_seats() {
        let fx = fixture(&[("S1", 81000), ("S2", 81000), ("S3", 90000), ("S4", 90000), ("S10", 75050)]).await;
        let user = Uuid::new_v4();

        let subsets: [&[&str]; 4] = [&["S1"], &["S3", "S10"], &["S1", "S2", "S4"], &["S10"]];
        for (i, subset) in subsets.iter().enumerate() {
            let record = fx.ledger
                .create_booking(user, &request(&fx.bus, day(i as u32 + 1), subset))
                .await
                .unwrap();
            let expected: i64 = subset.iter().map(|no| match *no {
                "S1" | "S2" => 81000,
                "S3" | "S4" => 90000,
                _ => 75050,
            }).sum();
            assert_eq!(record.amount, expected);
        }
    }

    #[tokio::test]
    async fn test_unknown_seat_writes_nothing() {
        let fx = fixture(&[("A1", 50000)]).await;
        let user = Uuid::new_v4();

        let err = fx.ledger.create_booking(user, &request(&fx.bus, day(1), &["A1", "Z9"])).await.unwrap_err();
        match err {
            CoreError::NotFound(msg) => assert_eq!(msg, "Seat Z9 not found"),
            other => panic!("expected NotFound, got {:?}", other),
        }

        assert!(fx.store.list_bookings_for_user(user).await.unwrap().is_empty());
        assert!(fx.store.held_seat_ids(fx.bus.id, day(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_validation() {
        let fx = fixture(&[("A1", 50000)]).await;
        let user = Uuid::new_v4();

        let empty = fx.ledger.create_booking(user, &request(&fx.bus, day(1), &[])).await;
        assert!(matches!(empty, Err(CoreError::InvalidRequest(_))));

        let dup = fx.ledger.create_booking(user, &request(&fx.bus, day(1), &["A1", "A1"])).await;
        assert!(matches!(dup, Err(CoreError::InvalidRequest(_))));

        let mut bad_id = request(&fx.bus, day(1), &["A1"]);
        bad_id.bus_id = "BUS101".to_string();
        let bad = fx.ledger.create_booking(user, &bad_id).await;
        assert!(matches!(bad, Err(CoreError::InvalidRequest(_))));

        let mut missing = request(&fx.bus, day(1), &["A1"]);
        missing.bus_id = Uuid::new_v4().to_string();
        let missing = fx.ledger.create_booking(user, &missing).await;
        assert!(matches!(missing, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_held_seat_conflicts_only_on_same_date() {
        let fx = fixture(&[("A1", 50000), ("A2", 60000)]).await;

        fx.ledger.create_booking(Uuid::new_v4(), &request(&fx.bus, day(1), &["A1"])).await.unwrap();

        let clash = fx.ledger.create_booking(Uuid::new_v4(), &request(&fx.bus, day(1), &["A2", "A1"])).await;
        assert!(matches!(clash, Err(CoreError::Conflict(_))));
        // the losing request must not leave A2 held
        let layout = fx.seats.seat_layout(&fx.bus.id.to_string(), Some(day(1))).await;
        assert_eq!(unavailable(&layout), vec!["A1"]);

        fx.ledger.create_booking(Uuid::new_v4(), &request(&fx.bus, day(2), &["A1"])).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_bookings_for_same_seat() {
        let fx = fixture(&[("A1", 50000), ("A2", 60000)]).await;
        let ledger = Arc::new(fx.ledger.clone());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            let req = request(&fx.bus, day(5), &["A1"]);
            handles.push(tokio::spawn(async move {
                ledger.create_booking(Uuid::new_v4(), &req).await
            }));
        }

        let mut ok = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(CoreError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error {:?}", other),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(conflicts, 7);
    }

    #[tokio::test]
    async fn test_cancel_twice_is_invalid_state() {
        let fx = fixture(&[("A1", 50000)]).await;
        let user = Uuid::new_v4();
        let record = fx.ledger.create_booking(user, &request(&fx.bus, day(1), &["A1"])).await.unwrap();
        let id = record.booking_id.to_string();

        fx.ledger.cancel_booking(&id, user).await.unwrap();
        let before = fx.store.get_booking(record.booking_id).await.unwrap().unwrap();

        for _ in 0..2 {
            let err = fx.ledger.cancel_booking(&id, user).await.unwrap_err();
            assert!(matches!(err, CoreError::InvalidState(_)));
        }
        let after = fx.store.get_booking(record.booking_id).await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_cancel_hides_other_users_bookings() {
        let fx = fixture(&[("A1", 50000)]).await;
        let owner = Uuid::new_v4();
        let record = fx.ledger.create_booking(owner, &request(&fx.bus, day(1), &["A1"])).await.unwrap();

        let stranger = fx.ledger.cancel_booking(&record.booking_id.to_string(), Uuid::new_v4()).await.unwrap_err();
        let missing = fx.ledger.cancel_booking(&Uuid::new_v4().to_string(), owner).await.unwrap_err();
        let malformed = fx.ledger.cancel_booking("BKG001", owner).await.unwrap_err();
        assert_eq!(stranger.to_string(), missing.to_string());
        assert_eq!(malformed.to_string(), missing.to_string());

        let booking = fx.store.get_booking(record.booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_user_bookings_newest_first() {
        let fx = fixture(&[("S1", 50000), ("S2", 50000), ("S10", 70000)]).await;
        let user = Uuid::new_v4();

        let first = fx.ledger.create_booking(user, &request(&fx.bus, day(1), &["S10", "S2"])).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = fx.ledger.create_booking(user, &request(&fx.bus, day(2), &["S1"])).await.unwrap();
        fx.ledger.cancel_booking(&second.booking_id.to_string(), user).await.unwrap();
        fx.ledger.create_booking(Uuid::new_v4(), &request(&fx.bus, day(3), &["S1"])).await.unwrap();

        let list = fx.ledger.get_user_bookings(user).await;
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].booking_id, second.booking_id);
        assert_eq!(list[0].status, BookingStatus::Cancelled);
        assert!(list[0].seats.is_empty());
        assert_eq!(list[1].booking_id, first.booking_id);
        assert_eq!(list[1].seats, vec!["S2", "S10"]);
        assert_eq!(list[1].from_city, "Bangalore");
    }

    #[tokio::test]
    async fn test_cancel_without_reservations_leaves_booking_confirmed() {
        let fx = fixture(&[("A1", 50000)]).await;
        let user = Uuid::new_v4();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: user,
            bus_id: fx.bus.id,
            travel_date: day(1),
            status: BookingStatus::Confirmed,
            amount: 0,
            created_at: Utc::now(),
        };
        fx.store.insert_booking(&booking, &[]).await.unwrap();

        let err = fx.ledger.cancel_booking(&booking.id.to_string(), user).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(ref msg) if msg == "No seats found for this booking"));

        let stored = fx.store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
    }
}
