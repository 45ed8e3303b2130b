use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use sqlx::PgPool;
use busly_core::repository::UserRepository;
use busly_core::{CoreError, CoreResult};
use busly_shared::{Otp, User};
use crate::database::storage_error;

pub struct StoreUserRepository {
    pool: PgPool,
}

impl StoreUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    country_code: String,
    phone: String,
    email: Option<String>,
    name: Option<String>,
    gender: Option<String>,
    dob: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            country_code: row.country_code,
            phone: row.phone,
            email: row.email,
            name: row.name,
            gender: row.gender,
            dob: row.dob,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OtpRow {
    id: Uuid,
    country_code: String,
    phone: String,
    otp_code: String,
    expires_at: DateTime<Utc>,
    is_used: bool,
    created_at: DateTime<Utc>,
}

impl From<OtpRow> for Otp {
    fn from(row: OtpRow) -> Self {
        Otp {
            id: row.id,
            country_code: row.country_code,
            phone: row.phone,
            code: row.otp_code,
            expires_at: row.expires_at,
            is_used: row.is_used,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, country_code, phone, email, name, gender, dob, created_at, updated_at";

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_phone(&self, phone: &str) -> CoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE phone = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(row.map(User::from))
    }

    async fn create_user(&self, user: &User) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, country_code, phone, email, name, gender, dob, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.country_code)
        .bind(&user.phone)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.gender)
        .bind(user.dob)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> CoreResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET email = $1, name = $2, gender = $3, dob = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.gender)
        .bind(user.dob)
        .bind(user.updated_at)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?
        .rows_affected();

        if updated == 0 {
            return Err(CoreError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn create_otp(&self, otp: &Otp) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO otps (id, country_code, phone, otp_code, expires_at, is_used, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(otp.id)
        .bind(&otp.country_code)
        .bind(&otp.phone)
        .bind(&otp.code)
        .bind(otp.expires_at)
        .bind(otp.is_used)
        .bind(otp.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn get_otp(&self, id: Uuid) -> CoreResult<Option<Otp>> {
        let row = sqlx::query_as::<_, OtpRow>(
            "SELECT id, country_code, phone, otp_code, expires_at, is_used, created_at FROM otps WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(row.map(Otp::from))
    }

    async fn consume_otp(&self, id: Uuid) -> CoreResult<bool> {
        let consumed = sqlx::query("UPDATE otps SET is_used = TRUE WHERE id = $1 AND is_used = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?
            .rows_affected();
        Ok(consumed == 1)
    }
}
