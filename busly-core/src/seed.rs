use chrono::{Duration, NaiveDate};
use uuid::Uuid;
use busly_shared::{Bus, City, Seat, Trip, TripStatus};

const CITIES: [(&str, &str); 10] = [
    ("Mumbai", "Maharashtra"),
    ("Delhi", "Delhi"),
    ("Bangalore", "Karnataka"),
    ("Chennai", "Tamil Nadu"),
    ("Hyderabad", "Telangana"),
    ("Pune", "Maharashtra"),
    ("Kolkata", "West Bengal"),
    ("Ahmedabad", "Gujarat"),
    ("Jaipur", "Rajasthan"),
    ("Surat", "Gujarat"),
];

// operator, from, to, departs, arrives, duration, fare (minor units), rating
const BUSES: [(&str, &str, &str, &str, &str, &str, i64, f64); 10] = [
    ("VRL Travels", "Mumbai", "Bangalore", "22:30", "10:30", "12h", 120000, 4.5),
    ("RedBus Express", "Delhi", "Mumbai", "20:00", "12:00", "16h", 150000, 4.2),
    ("SRS Travels", "Bangalore", "Chennai", "23:00", "07:00", "8h", 80000, 4.3),
    ("Orange Travels", "Hyderabad", "Bangalore", "21:30", "06:30", "9h", 90000, 4.1),
    ("Shama Travels", "Pune", "Mumbai", "06:00", "09:30", "3.5h", 40000, 4.0),
    ("KSRTC", "Bangalore", "Hyderabad", "22:00", "07:00", "9h", 95000, 4.4),
    ("Raj Travels", "Delhi", "Jaipur", "07:00", "12:00", "5h", 60000, 4.2),
    ("Gujarat Travels", "Ahmedabad", "Mumbai", "21:00", "07:00", "10h", 100000, 4.3),
    ("Volvo Express", "Chennai", "Bangalore", "23:30", "07:30", "8h", 85000, 4.6),
    ("Super Fast", "Mumbai", "Pune", "08:00", "11:00", "3h", 35000, 4.1),
];

const SEATS_PER_BUS: usize = 36;
const SCHEDULE_DAYS: i64 = 30;

const CITY: u128 = 1;
const BUS: u128 = 2;
const SEAT: u128 = 3;
const TRIP: u128 = 4;

/// Stable ids laid out as kind, index, sub-index, so reseeding a fresh
/// store yields the same rows.
fn seed_id(kind: u128, index: usize, sub: usize) -> Uuid {
    Uuid::from_u128(kind << 96 | (index as u128) << 48 | sub as u128)
}

/// Reference data to bootstrap an empty catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogSeed {
    pub cities: Vec<City>,
    pub buses: Vec<Bus>,
    pub seats: Vec<Seat>,
    pub trips: Vec<Trip>,
}

impl CatalogSeed {
    /// Ten cities, ten sleeper buses with 36 berths each and a daily trip for
    /// `SCHEDULE_DAYS` days starting at `first_day`. Lower berths cost 90% of
    /// the fare, upper berths the full fare.
    pub fn demo(first_day: NaiveDate) -> Self {
        let cities: Vec<City> = CITIES
            .iter()
            .enumerate()
            .map(|(i, (name, state))| City {
                id: seed_id(CITY, i, 0),
                name: name.to_string(),
                state: Some(state.to_string()),
            })
            .collect();

        let city_id = |name: &str| {
            cities.iter().find(|c| c.name == name).map(|c| c.id).unwrap_or_default()
        };

        let buses: Vec<Bus> = BUSES
            .iter()
            .enumerate()
            .map(|(i, (operator, from, to, departs, arrives, duration, fare, rating))| Bus {
                id: seed_id(BUS, i, 0),
                operator: operator.to_string(),
                from_city_id: city_id(from),
                to_city_id: city_id(to),
                departure_time: departs.to_string(),
                arrival_time: arrives.to_string(),
                duration: Some(duration.to_string()),
                fare: *fare,
                rating: Some(*rating),
            })
            .collect();

        let mut seats = Vec::with_capacity(buses.len() * SEATS_PER_BUS);
        let mut trips = Vec::new();
        for (b, bus) in buses.iter().enumerate() {
            for n in 1..=SEATS_PER_BUS {
                // berths come in pairs: two lower, two upper
                let lower = (n - 1) % 4 < 2;
                seats.push(Seat {
                    id: seed_id(SEAT, b, n),
                    bus_id: bus.id,
                    seat_no: format!("S{}", n),
                    seat_type: if lower { "Lower" } else { "Upper" }.to_string(),
                    price: if lower { bus.fare * 9 / 10 } else { bus.fare },
                });
            }
            for offset in 0..SCHEDULE_DAYS {
                trips.push(Trip {
                    id: seed_id(TRIP, b, offset as usize),
                    bus_id: bus.id,
                    service_date: first_day + Duration::days(offset),
                    departure_time: Some(bus.departure_time.clone()),
                    arrival_time: Some(bus.arrival_time.clone()),
                    status: TripStatus::Active,
                });
            }
        }

        Self { cities, buses, seats, trips }
    }
}
