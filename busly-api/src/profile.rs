use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use busly_core::{ProfileSummary, ProfileUpdate};
use busly_shared::User;
use crate::{error::AppError, middleware::CurrentUser, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/me", get(me).put(update_me))
        .route("/api/me/profile", get(profile))
}

async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}

async fn update_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.profiles.update_profile(user.id, update).await?))
}

async fn profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ProfileSummary>, AppError> {
    Ok(Json(state.profiles.profile_summary(user.id).await?))
}
