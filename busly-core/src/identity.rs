use std::sync::Arc;
use chrono::{Duration, Utc};
use rand::Rng;
use serde::Deserialize;
use uuid::Uuid;
use busly_shared::{Masked, Otp, User};
use crate::repository::UserRepository;
use crate::{CoreError, CoreResult};

const INVALID_OTP: &str = "Invalid or expired OTP";

#[derive(Debug, Clone, Deserialize)]
pub struct OtpSettings {
    pub ttl_seconds: u64,
    pub length: usize,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self { ttl_seconds: 300, length: 6 }
    }
}

pub fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect()
}

fn validate_phone(country_code: &str, phone: &str) -> CoreResult<()> {
    let cc_digits = country_code.strip_prefix('+').unwrap_or("");
    if cc_digits.is_empty() || cc_digits.len() > 4 || !cc_digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::InvalidRequest(format!("Invalid country code: {}", country_code)));
    }
    if phone.len() < 4 || phone.len() > 15 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::InvalidRequest("Phone number must be 4 to 15 digits".to_string()));
    }
    Ok(())
}

/// Phone login: issue a one-time code, then trade a correct code for a user,
/// creating the user on first login. Token minting is the caller's job.
#[derive(Clone)]
pub struct OtpIdentity {
    users: Arc<dyn UserRepository>,
    settings: OtpSettings,
}

impl OtpIdentity {
    pub fn new(users: Arc<dyn UserRepository>, settings: OtpSettings) -> Self {
        Self { users, settings }
    }

    pub async fn request_otp(&self, country_code: &str, phone: &str) -> CoreResult<Uuid> {
        validate_phone(country_code, phone)?;

        let now = Utc::now();
        let expires_at = i64::try_from(self.settings.ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| CoreError::InvalidRequest(format!(
                "OTP lifetime of {}s is out of range", self.settings.ttl_seconds
            )))?;

        let otp = Otp {
            id: Uuid::new_v4(),
            country_code: country_code.to_string(),
            phone: format!("{}{}", country_code, phone),
            code: generate_code(self.settings.length),
            expires_at,
            is_used: false,
            created_at: now,
        };
        self.users.create_otp(&otp).await?;

        // No SMS gateway; the code only ever reaches debug logs
        tracing::debug!("OTP {} for {} is {}", otp.id, Masked(&otp.phone), otp.code);
        tracing::info!("Issued OTP {} for {}", otp.id, Masked(&otp.phone));

        Ok(otp.id)
    }

    pub async fn verify_otp(&self, otp_id: Uuid, code: &str) -> CoreResult<User> {
        // 1. Lookup, expiry and code checks share one error to avoid probing
        let otp = self.users.get_otp(otp_id).await?
            .ok_or_else(|| CoreError::Unauthorized(INVALID_OTP.to_string()))?;

        if otp.is_used || otp.is_expired(Utc::now()) || otp.code != code {
            return Err(CoreError::Unauthorized(INVALID_OTP.to_string()));
        }

        // 2. Single use
        if !self.users.consume_otp(otp_id).await? {
            return Err(CoreError::Unauthorized(INVALID_OTP.to_string()));
        }

        // 3. Find or create
        if let Some(user) = self.users.find_user_by_phone(&otp.phone).await? {
            tracing::info!("Existing user {} logged in", user.id);
            return Ok(user);
        }

        let user = User::new(&otp.country_code, &otp.phone);
        match self.users.create_user(&user).await {
            Ok(()) => {
                tracing::info!("Created user {} for {}", user.id, Masked(&user.phone));
                Ok(user)
            }
            // Lost a race with another login for the same phone
            Err(CoreError::Conflict(_)) => self.users.find_user_by_phone(&otp.phone).await?
                .ok_or_else(|| CoreError::Storage("user vanished after phone conflict".to_string())),
            Err(e) => Err(e),
        }
    }
}
