use std::sync::Arc;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use busly_shared::User;
use crate::repository::{BookingRepository, UserRepository};
use crate::{CoreError, CoreResult};

const ALLOWED_GENDERS: [&str; 3] = ["Male", "Female", "Other"];
const MAX_NAME_LEN: usize = 100;

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
}

impl ProfileUpdate {
    fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() || name.chars().count() > MAX_NAME_LEN {
                return Err(CoreError::InvalidRequest(format!("Name must be 1 to {} characters", MAX_NAME_LEN)));
            }
        }
        if let Some(email) = &self.email {
            let valid = email.split_once('@').is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if !valid {
                return Err(CoreError::InvalidRequest(format!("Invalid email address: {}", email)));
            }
        }
        if let Some(gender) = &self.gender {
            if !ALLOWED_GENDERS.contains(&gender.as_str()) {
                return Err(CoreError::InvalidRequest("Gender must be Male, Female, or Other".to_string()));
            }
        }
        Ok(())
    }

    fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = Some(name);
        }
        if let Some(email) = self.email {
            user.email = Some(email);
        }
        if let Some(gender) = self.gender {
            user.gender = Some(gender);
        }
        if let Some(dob) = self.dob {
            user.dob = Some(dob);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub phone: String,
    pub country_code: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub total_bookings: usize,
    pub total_amount_spent: i64,
    pub wallet_balance: i64,
    pub personal_details_added: bool,
}

#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    bookings: Arc<dyn BookingRepository>,
    wallet_credit_per_booking: i64,
}

impl ProfileService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        bookings: Arc<dyn BookingRepository>,
        wallet_credit_per_booking: i64,
    ) -> Self {
        Self { users, bookings, wallet_credit_per_booking }
    }

    pub async fn get_user(&self, user_id: Uuid) -> CoreResult<User> {
        self.users.get_user(user_id).await?
            .ok_or_else(|| CoreError::NotFound("User not found".to_string()))
    }

    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> CoreResult<User> {
        update.validate()?;

        let mut user = self.get_user(user_id).await?;
        update.apply(&mut user);
        user.updated_at = Some(Utc::now());

        self.users.update_user(&user).await?;
        tracing::info!("Updated profile of user {}", user_id);
        Ok(user)
    }

    /// Counts every booking the user ever made, cancelled ones included.
    pub async fn profile_summary(&self, user_id: Uuid) -> CoreResult<ProfileSummary> {
        let user = self.get_user(user_id).await?;
        let bookings = self.bookings.list_bookings_for_user(user_id).await?;

        let total_bookings = bookings.len();
        let total_amount_spent = bookings.iter().map(|b| b.amount).sum();

        Ok(ProfileSummary {
            personal_details_added: user.has_personal_details(),
            id: user.id,
            phone: user.phone,
            country_code: user.country_code,
            name: user.name,
            email: user.email,
            gender: user.gender,
            dob: user.dob,
            total_bookings,
            total_amount_spent,
            wallet_balance: total_bookings as i64 * self.wallet_credit_per_booking,
        })
    }
}
