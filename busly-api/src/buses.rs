use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use busly_core::{BusSearchRequest, BusSummary, SeatLayout};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct SearchResponse {
    buses: Vec<BusSummary>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct SeatsQuery {
    travel_date: Option<NaiveDate>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/search-buses", post(search_buses))
        .route("/api/bus/{bus_id}/seats", get(bus_seats))
}

async fn search_buses(
    State(state): State<AppState>,
    Json(req): Json<BusSearchRequest>,
) -> Json<SearchResponse> {
    let buses = state.directory.search_buses(&req).await;
    let message = if buses.is_empty() {
        "No buses found for this route".to_string()
    } else {
        format!("Found {} buses", buses.len())
    };

    Json(SearchResponse { buses, message })
}

/// Malformed ids and storage failures answer with an empty layout.
async fn bus_seats(
    State(state): State<AppState>,
    Path(bus_id): Path<String>,
    Query(query): Query<SeatsQuery>,
) -> Json<SeatLayout> {
    Json(state.seats.seat_layout(&bus_id, query.travel_date).await)
}
