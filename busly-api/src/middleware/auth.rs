use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use busly_core::CoreError;
use busly_shared::User;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// The authenticated caller, inserted into request extensions by `require_user`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let unauthorized = || AppError::AuthenticationError("Could not validate credentials".to_string());

    // 1. Bearer token from the Authorization header
    let Authorization(bearer) = req.headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(unauthorized)?;

    // 2. Signature and expiry
    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    ).map_err(|_| unauthorized())?;

    // 3. The subject must still exist
    let user_id = Uuid::parse_str(&token_data.claims.sub).map_err(|_| unauthorized())?;
    let user = match state.profiles.get_user(user_id).await {
        Ok(user) => user,
        Err(CoreError::NotFound(_)) => return Err(unauthorized()),
        Err(e) => return Err(e.into()),
    };

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
