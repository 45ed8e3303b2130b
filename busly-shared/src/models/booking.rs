use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// Booking status. CANCELLED is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bus_id: Uuid,
    pub travel_date: NaiveDate,
    pub status: BookingStatus,
    /// Sum of seat prices captured at creation, in minor units
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Reservation record. Its existence makes the seat unavailable for
/// (bus_id, travel_date).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingSeat {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub seat_id: Uuid,
    pub bus_id: Uuid,
    pub travel_date: NaiveDate,
}

impl BookingSeat {
    pub fn new(booking: &Booking, seat_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            seat_id,
            bus_id: booking.bus_id,
            travel_date: booking.travel_date,
        }
    }
}
