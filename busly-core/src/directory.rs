use std::sync::Arc;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;
use busly_shared::{Bus, City, Seat};
use crate::repository::CatalogRepository;

const UNKNOWN_CITY: &str = "Unknown";

/// Clock order of an `H:MM`/`HH:MM` departure; unparseable times sort last.
fn departure_key(time: &str) -> (bool, Option<NaiveTime>) {
    let parsed = NaiveTime::parse_from_str(time.trim(), "%H:%M").ok();
    (parsed.is_none(), parsed)
}

#[derive(Debug, Deserialize)]
pub struct BusSearchRequest {
    pub from_city_id: Uuid,
    pub to_city_id: Uuid,
    pub date: Option<NaiveDate>,
    pub travel_date: Option<NaiveDate>,
}

impl BusSearchRequest {
    /// Clients send either field; `travel_date` wins.
    pub fn service_date(&self) -> Option<NaiveDate> {
        self.travel_date.or(self.date)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BusSummary {
    pub id: Uuid,
    pub operator: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub fare: i64,
    pub rating: f64,
}

impl From<Bus> for BusSummary {
    fn from(bus: Bus) -> Self {
        Self {
            id: bus.id,
            operator: bus.operator,
            departure_time: bus.departure_time,
            arrival_time: bus.arrival_time,
            duration: bus.duration.unwrap_or_else(|| "N/A".to_string()),
            fare: bus.fare,
            rating: bus.rating.unwrap_or(0.0),
        }
    }
}

/// City and route lookups. Reads here degrade to empty results instead of
/// failing, so listing screens keep rendering when storage hiccups.
#[derive(Clone)]
pub struct RouteDirectory {
    catalog: Arc<dyn CatalogRepository>,
}

impl RouteDirectory {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    pub async fn list_cities(&self) -> Vec<City> {
        match self.catalog.list_cities().await {
            Ok(mut cities) => {
                cities.sort_by(|a, b| a.name.cmp(&b.name));
                cities
            }
            Err(e) => {
                warn!("Failed to list cities: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn search_buses(&self, req: &BusSearchRequest) -> Vec<BusSummary> {
        let date = req.service_date();
        let buses = match self.catalog.find_buses(req.from_city_id, req.to_city_id, date).await {
            Ok(buses) => buses,
            Err(e) => {
                warn!("Bus search failed: {}", e);
                return Vec::new();
            }
        };

        debug!(
            "Found {} buses for route {} -> {} on {:?}",
            buses.len(), req.from_city_id, req.to_city_id, date
        );

        let mut summaries: Vec<BusSummary> = buses.into_iter().map(BusSummary::from).collect();
        summaries.sort_by_key(|s| (departure_key(&s.departure_time), s.id));
        summaries
    }

    pub async fn bus(&self, id: Uuid) -> crate::CoreResult<Option<Bus>> {
        self.catalog.get_bus(id).await
    }

    pub async fn seats_for_bus(&self, bus_id: Uuid) -> crate::CoreResult<Vec<Seat>> {
        self.catalog.seats_for_bus(bus_id).await
    }

    /// City name for display, "Unknown" when missing or unreadable.
    pub async fn city_name(&self, id: Uuid) -> String {
        match self.catalog.get_city(id).await {
            Ok(Some(city)) => city.name,
            Ok(None) => UNKNOWN_CITY.to_string(),
            Err(e) => {
                warn!("City lookup failed for {}: {}", id, e);
                UNKNOWN_CITY.to_string()
            }
        }
    }

    /// (from, to) city names of a bus
    pub async fn route_names(&self, bus: &Bus) -> (String, String) {
        let from = self.city_name(bus.from_city_id).await;
        let to = self.city_name(bus.to_city_id).await;
        (from, to)
    }
}
