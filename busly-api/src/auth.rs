use axum::{
    extract::State,
    Json,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use jsonwebtoken::{encode, Header, EncodingKey};
use chrono::{Utc, Duration};
use uuid::Uuid;
use busly_shared::User;
use crate::{state::{AppState, AuthConfig}, error::AppError, middleware::auth::Claims};

#[derive(Debug, Deserialize)]
struct OtpRequest {
    #[serde(default = "default_country_code")]
    country_code: String,
    phone: String,
}

fn default_country_code() -> String {
    "+91".to_string()
}

#[derive(Debug, Serialize)]
struct OtpRequestResponse {
    success: bool,
    message: String,
    otp_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct VerifyOtpRequest {
    otp_id: Uuid,
    otp: String,
}

#[derive(Debug, Serialize)]
struct UserBrief {
    id: Uuid,
    name: Option<String>,
    phone: String,
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: UserBrief,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/login/request-otp", post(request_otp))
        .route("/api/login/verify-otp", post(verify_otp))
}

async fn request_otp(
    State(state): State<AppState>,
    Json(req): Json<OtpRequest>,
) -> Result<Json<OtpRequestResponse>, AppError> {
    let otp_id = state.identity.request_otp(&req.country_code, &req.phone).await?;

    Ok(Json(OtpRequestResponse {
        success: true,
        message: "OTP sent successfully".to_string(),
        otp_id,
    }))
}

async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state.identity.verify_otp(req.otp_id, &req.otp).await?;
    let token = issue_token(&state.auth, &user)?;

    Ok(Json(AuthResponse {
        token,
        user: UserBrief { id: user.id, name: user.name, phone: user.phone, email: user.email },
    }))
}

pub fn issue_token(auth: &AuthConfig, user: &User) -> Result<String, AppError> {
    let exp = i64::try_from(auth.expiration)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .and_then(|at| usize::try_from(at.timestamp()).ok())
        .ok_or_else(|| AppError::InternalServerError(format!(
            "Token lifetime of {}s is out of range", auth.expiration
        )))?;

    let claims = Claims {
        sub: user.id.to_string(),
        exp,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}
