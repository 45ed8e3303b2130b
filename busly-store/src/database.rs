use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;
use busly_core::CoreError;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Maps driver errors onto the domain taxonomy. Unique violations become
/// `Conflict`, a seat/bus mismatch `InvalidRequest`; everything else is an
/// opaque storage failure.
pub(crate) fn storage_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return CoreError::Conflict(match db_err.constraint() {
                Some("uq_booking_seats_bus_date_seat") => "One or more seats were just booked by someone else".to_string(),
                Some("uq_users_phone") => "Phone number already registered".to_string(),
                Some("uq_users_email") => "Email already in use".to_string(),
                _ => db_err.message().to_string(),
            });
        }
        if db_err.is_foreign_key_violation() && db_err.constraint() == Some("fk_booking_seats_seat") {
            return CoreError::InvalidRequest("Seat does not belong to the booked bus".to_string());
        }
    }
    CoreError::Storage(err.to_string())
}

pub(crate) fn corrupt(what: &str, detail: String) -> CoreError {
    CoreError::Storage(format!("corrupt {}: {}", what, detail))
}
