use std::collections::HashSet;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use sqlx::PgPool;
use busly_core::repository::BookingRepository;
use busly_core::{CoreError, CoreResult};
use busly_shared::{Booking, BookingSeat, Seat};
use crate::catalog_repo::SeatRow;
use crate::database::{corrupt, storage_error};

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    bus_id: Uuid,
    travel_date: NaiveDate,
    status: String,
    amount: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            status: row.status.parse().map_err(|e| corrupt("booking", e))?,
            id: row.id,
            user_id: row.user_id,
            bus_id: row.bus_id,
            travel_date: row.travel_date,
            amount: row.amount,
            created_at: row.created_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, user_id, bus_id, travel_date, status, amount, created_at";

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn insert_booking(&self, booking: &Booking, seats: &[Seat]) -> CoreResult<()> {
        let seat_ids: Vec<Uuid> = seats.iter().map(|s| s.id).collect();

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        // 1. Fail fast on seats already held for this bus and date. The unique
        //    key on booking_seats still decides races between transactions.
        let taken: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT s.seat_no FROM booking_seats bs
            JOIN seats s ON s.id = bs.seat_id
            JOIN bookings b ON b.id = bs.booking_id
            WHERE bs.bus_id = $1 AND bs.travel_date = $2 AND bs.seat_id = ANY($3)
              AND b.status = 'CONFIRMED'
            ORDER BY s.seat_no
            "#,
        )
        .bind(booking.bus_id)
        .bind(booking.travel_date)
        .bind(&seat_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(storage_error)?;

        if !taken.is_empty() {
            return Err(CoreError::Conflict(format!(
                "Seats {} are already booked for {}",
                taken.join(", "),
                booking.travel_date
            )));
        }

        // 2. Booking header
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, bus_id, travel_date, status, amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.bus_id)
        .bind(booking.travel_date)
        .bind(booking.status.as_str())
        .bind(booking.amount)
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        // 3. One reservation per seat
        for seat in seats {
            let link = BookingSeat::new(booking, seat.id);
            sqlx::query(
                r#"
                INSERT INTO booking_seats (id, booking_id, seat_id, bus_id, travel_date)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(link.id)
            .bind(link.booking_id)
            .bind(link.seat_id)
            .bind(link.bus_id)
            .bind(link.travel_date)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC, id",
            BOOKING_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn seats_for_booking(&self, booking_id: Uuid) -> CoreResult<Vec<Seat>> {
        let rows = sqlx::query_as::<_, SeatRow>(
            r#"
            SELECT s.id, s.bus_id, s.seat_no, s.seat_type, s.price
            FROM booking_seats bs JOIN seats s ON s.id = bs.seat_id
            WHERE bs.booking_id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(rows.into_iter().map(Seat::from).collect())
    }

    async fn held_seat_ids(&self, bus_id: Uuid, travel_date: NaiveDate) -> CoreResult<HashSet<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT bs.seat_id FROM booking_seats bs
            JOIN bookings b ON b.id = bs.booking_id
            WHERE bs.bus_id = $1 AND bs.travel_date = $2 AND b.status = 'CONFIRMED'
            "#,
        )
        .bind(bus_id)
        .bind(travel_date)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(ids.into_iter().collect())
    }

    async fn cancel_booking(&self, booking_id: Uuid) -> CoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        // Row lock on the booking serialises concurrent cancels
        let flipped = sqlx::query(
            "UPDATE bookings SET status = 'CANCELLED', updated_at = NOW() WHERE id = $1 AND status = 'CONFIRMED'",
        )
        .bind(booking_id)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?
        .rows_affected();

        if flipped == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM booking_seats WHERE booking_id = $1")
            .bind(booking_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(true)
    }
}
