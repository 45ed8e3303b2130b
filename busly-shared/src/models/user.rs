use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub country_code: String,
    /// Full phone including country code, unique across users
    pub phone: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(country_code: &str, phone: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            country_code: country_code.to_string(),
            phone: phone.to_string(),
            email: None,
            name: None,
            gender: None,
            dob: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn has_personal_details(&self) -> bool {
        self.name.is_some() && self.email.is_some() && self.gender.is_some() && self.dob.is_some()
    }
}

/// One-time login code issued for a phone number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Otp {
    pub id: Uuid,
    pub country_code: String,
    pub phone: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
}

impl Otp {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
