use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::NaiveDate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct City {
    pub id: Uuid,
    pub name: String,
    pub state: Option<String>,
}

/// A scheduled service between two cities. Reference data for bookings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bus {
    pub id: Uuid,
    pub operator: String,
    pub from_city_id: Uuid,
    pub to_city_id: Uuid,
    /// Local clock time, `HH:MM` (24h)
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: Option<String>,
    /// Base fare in minor units
    pub fare: i64,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Active,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Active => "ACTIVE",
            TripStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(TripStatus::Active),
            "CANCELLED" => Ok(TripStatus::Cancelled),
            other => Err(format!("unknown trip status: {}", other)),
        }
    }
}

/// A bus running on a specific calendar date. At most one per (bus, date).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub id: Uuid,
    pub bus_id: Uuid,
    pub service_date: NaiveDate,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub status: TripStatus,
}

/// A purchasable seat. Availability is per date and never stored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Seat {
    pub id: Uuid,
    pub bus_id: Uuid,
    pub seat_no: String,
    pub seat_type: String, // Lower / Upper / Seater
    pub price: i64,
}

impl Seat {
    /// Ordering key so that "S2" sorts before "S10".
    pub fn natural_key(&self) -> (String, u64, String) {
        natural_key(&self.seat_no)
    }
}

pub fn natural_key(seat_no: &str) -> (String, u64, String) {
    let prefix: String = seat_no.chars().take_while(|c| !c.is_ascii_digit()).collect();
    let rest = &seat_no[prefix.len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let number = digits.parse::<u64>().unwrap_or(0);
    let suffix = rest[digits.len()..].to_string();
    (prefix, number, suffix)
}
