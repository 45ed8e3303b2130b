use std::collections::HashSet;
use std::sync::Arc;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;
use busly_shared::Seat;
use crate::directory::RouteDirectory;
use crate::repository::BookingRepository;
use crate::CoreResult;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeatAvailability {
    pub id: Uuid,
    pub seat_no: String,
    pub seat_type: String,
    pub price: i64,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatLayout {
    pub bus_id: String,
    pub seats: Vec<SeatAvailability>,
}

/// Marks each seat available unless its id is in `held`. Output is in
/// natural seat-number order.
pub fn mark_availability(mut seats: Vec<Seat>, held: &HashSet<Uuid>) -> Vec<SeatAvailability> {
    seats.sort_by_key(|s| s.natural_key());
    seats
        .into_iter()
        .map(|seat| SeatAvailability {
            is_available: !held.contains(&seat.id),
            id: seat.id,
            seat_no: seat.seat_no,
            seat_type: seat.seat_type,
            price: seat.price,
        })
        .collect()
}

/// Seat layout with per-date availability derived from active reservations.
#[derive(Clone)]
pub struct SeatAvailabilityQuery {
    directory: RouteDirectory,
    bookings: Arc<dyn BookingRepository>,
}

impl SeatAvailabilityQuery {
    pub fn new(directory: RouteDirectory, bookings: Arc<dyn BookingRepository>) -> Self {
        Self { directory, bookings }
    }

    /// Without a date every seat is reported available. A malformed bus id or
    /// a storage failure yields an empty seat list, never an error.
    pub async fn seat_layout(&self, bus_id: &str, travel_date: Option<NaiveDate>) -> SeatLayout {
        let seats = match Uuid::parse_str(bus_id) {
            Ok(id) => self.try_layout(id, travel_date).await.unwrap_or_else(|e| {
                warn!("Failed to build seat layout for bus {}: {}", bus_id, e);
                Vec::new()
            }),
            Err(_) => {
                warn!("Invalid bus id format: {}", bus_id);
                Vec::new()
            }
        };

        SeatLayout {
            bus_id: bus_id.to_string(),
            seats,
        }
    }

    async fn try_layout(&self, bus_id: Uuid, travel_date: Option<NaiveDate>) -> CoreResult<Vec<SeatAvailability>> {
        let seats = self.directory.seats_for_bus(bus_id).await?;
        if seats.is_empty() {
            return Ok(Vec::new());
        }

        let held = match travel_date {
            Some(date) => self.bookings.held_seat_ids(bus_id, date).await?,
            None => HashSet::new(),
        };

        let layout = mark_availability(seats, &held);
        debug!(
            "Bus {} on {:?}: {}/{} seats available",
            bus_id,
            travel_date,
            layout.iter().filter(|s| s.is_available).count(),
            layout.len()
        );
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use busly_shared::{Booking, BookingStatus};
    use chrono::Utc;

    fn seat(bus_id: Uuid, no: &str) -> Seat {
        Seat {
            id: Uuid::new_v4(),
            bus_id,
            seat_no: no.to_string(),
            seat_type: "Seater".to_string(),
            price: 50000,
        }
    }

    #[test]
    fn test_mark_availability() {
        let bus = Uuid::new_v4();
        let seats = vec![seat(bus, "A2"), seat(bus, "A10"), seat(bus, "A1")];
        let held: HashSet<Uuid> = [seats[0].id].into_iter().collect();

        let layout = mark_availability(seats, &held);
        let view: Vec<(&str, bool)> = layout.iter().map(|s| (s.seat_no.as_str(), s.is_available)).collect();
        assert_eq!(view, vec![("A1", true), ("A2", false), ("A10", true)]);
    }

    #[tokio::test]
    async fn test_layout_reflects_single_booking() {
        let store = Arc::new(InMemoryStore::new());
        let bus = Uuid::new_v4();
        let a1 = seat(bus, "A1");
        for s in [a1.clone(), seat(bus, "A2"), seat(bus, "B1")] {
            store.add_seat(s).await;
        }
        let query = SeatAvailabilityQuery::new(RouteDirectory::new(store.clone()), store.clone());
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let empty = query.seat_layout(&bus.to_string(), Some(date)).await;
        assert_eq!(empty.seats.len(), 3);
        assert!(empty.seats.iter().all(|s| s.is_available));

        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            bus_id: bus,
            travel_date: date,
            status: BookingStatus::Confirmed,
            amount: a1.price,
            created_at: Utc::now(),
        };
        store.insert_booking(&booking, &[a1.clone()]).await.unwrap();

        let layout = query.seat_layout(&bus.to_string(), Some(date)).await;
        let taken: Vec<&str> = layout.seats.iter().filter(|s| !s.is_available).map(|s| s.seat_no.as_str()).collect();
        assert_eq!(taken, vec!["A1"]);

        // no date: nothing to check against
        let undated = query.seat_layout(&bus.to_string(), None).await;
        assert!(undated.seats.iter().all(|s| s.is_available));

        let next_day = query.seat_layout(&bus.to_string(), date.succ_opt()).await;
        assert!(next_day.seats.iter().all(|s| s.is_available));
    }

    #[tokio::test]
    async fn test_malformed_bus_id_is_empty() {
        let store = Arc::new(InMemoryStore::new());
        let query = SeatAvailabilityQuery::new(RouteDirectory::new(store.clone()), store);

        let layout = query.seat_layout("not-a-uuid", None).await;
        assert_eq!(layout.bus_id, "not-a-uuid");
        assert!(layout.seats.is_empty());
    }
}
