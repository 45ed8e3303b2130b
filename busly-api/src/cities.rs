use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use uuid::Uuid;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct CityItem {
    id: Uuid,
    name: String,
}

#[derive(Debug, Serialize)]
struct CitiesResponse {
    cities: Vec<CityItem>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/cities", get(list_cities))
}

async fn list_cities(State(state): State<AppState>) -> Json<CitiesResponse> {
    let cities = state.directory.list_cities().await
        .into_iter()
        .map(|c| CityItem { id: c.id, name: c.name })
        .collect();

    Json(CitiesResponse { cities })
}
