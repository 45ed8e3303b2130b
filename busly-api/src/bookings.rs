use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use busly_core::{BookingRecord, BookingRequest, BookingSummary, CancellationResult};
use crate::{error::AppError, middleware::CurrentUser, state::AppState};

#[derive(Debug, Serialize)]
struct BookingsResponse {
    bookings: Vec<BookingSummary>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/book", post(book))
        .route("/api/bookings", get(list_bookings))
        .route("/api/bookings/{booking_id}/cancel", post(cancel_booking))
}

async fn book(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingRecord>), AppError> {
    let record = state.ledger.create_booking(user.id, &req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<BookingsResponse> {
    Json(BookingsResponse { bookings: state.ledger.get_user_bookings(user.id).await })
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(booking_id): Path<String>,
) -> Result<Json<CancellationResult>, AppError> {
    Ok(Json(state.ledger.cancel_booking(&booking_id, user.id).await?))
}
