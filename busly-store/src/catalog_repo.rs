use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;
use sqlx::PgPool;
use busly_core::repository::CatalogRepository;
use busly_core::{CatalogSeed, CoreResult};
use busly_shared::{Bus, City, Seat};
use crate::database::storage_error;

pub struct StoreCatalogRepository {
    pool: PgPool,
}

impl StoreCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CityRow {
    id: Uuid,
    name: String,
    state: Option<String>,
}

impl From<CityRow> for City {
    fn from(row: CityRow) -> Self {
        City { id: row.id, name: row.name, state: row.state }
    }
}

#[derive(sqlx::FromRow)]
struct BusRow {
    id: Uuid,
    operator: String,
    from_city_id: Uuid,
    to_city_id: Uuid,
    departure_time: String,
    arrival_time: String,
    duration: Option<String>,
    fare: i64,
    rating: Option<f64>,
}

impl From<BusRow> for Bus {
    fn from(row: BusRow) -> Self {
        Bus {
            id: row.id,
            operator: row.operator,
            from_city_id: row.from_city_id,
            to_city_id: row.to_city_id,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            duration: row.duration,
            fare: row.fare,
            rating: row.rating,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SeatRow {
    id: Uuid,
    bus_id: Uuid,
    seat_no: String,
    seat_type: String,
    price: i64,
}

impl From<SeatRow> for Seat {
    fn from(row: SeatRow) -> Self {
        Seat {
            id: row.id,
            bus_id: row.bus_id,
            seat_no: row.seat_no,
            seat_type: row.seat_type,
            price: row.price,
        }
    }
}

const BUS_COLUMNS: &str =
    "b.id, b.operator, b.from_city_id, b.to_city_id, b.departure_time, b.arrival_time, b.duration, b.fare, b.rating";

#[async_trait]
impl CatalogRepository for StoreCatalogRepository {
    async fn list_cities(&self) -> CoreResult<Vec<City>> {
        let rows = sqlx::query_as::<_, CityRow>("SELECT id, name, state FROM cities ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(rows.into_iter().map(City::from).collect())
    }

    async fn get_city(&self, id: Uuid) -> CoreResult<Option<City>> {
        let row = sqlx::query_as::<_, CityRow>("SELECT id, name, state FROM cities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(row.map(City::from))
    }

    async fn get_bus(&self, id: Uuid) -> CoreResult<Option<Bus>> {
        let sql = format!("SELECT {} FROM buses b WHERE b.id = $1", BUS_COLUMNS);
        let row = sqlx::query_as::<_, BusRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(row.map(Bus::from))
    }

    async fn find_buses(
        &self,
        from_city_id: Uuid,
        to_city_id: Uuid,
        service_date: Option<NaiveDate>,
    ) -> CoreResult<Vec<Bus>> {
        let rows = match service_date {
            Some(date) => {
                let sql = format!(
                    r#"
                    SELECT {} FROM buses b
                    JOIN trips t ON t.bus_id = b.id
                    WHERE b.from_city_id = $1 AND b.to_city_id = $2
                      AND t.service_date = $3 AND t.status = 'ACTIVE'
                    ORDER BY b.id
                    "#,
                    BUS_COLUMNS
                );
                sqlx::query_as::<_, BusRow>(&sql)
                    .bind(from_city_id)
                    .bind(to_city_id)
                    .bind(date)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM buses b WHERE b.from_city_id = $1 AND b.to_city_id = $2 ORDER BY b.id",
                    BUS_COLUMNS
                );
                sqlx::query_as::<_, BusRow>(&sql)
                    .bind(from_city_id)
                    .bind(to_city_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Bus::from).collect())
    }

    async fn seats_for_bus(&self, bus_id: Uuid) -> CoreResult<Vec<Seat>> {
        let rows = sqlx::query_as::<_, SeatRow>(
            "SELECT id, bus_id, seat_no, seat_type, price FROM seats WHERE bus_id = $1",
        )
        .bind(bus_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(rows.into_iter().map(Seat::from).collect())
    }

    async fn load_catalog(&self, seed: &CatalogSeed) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cities")
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_error)?;
        if existing > 0 {
            tracing::info!("Catalog already has {} cities, skipping seed", existing);
            return Ok(());
        }

        for city in &seed.cities {
            sqlx::query("INSERT INTO cities (id, name, state) VALUES ($1, $2, $3)")
                .bind(city.id)
                .bind(&city.name)
                .bind(&city.state)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }

        for bus in &seed.buses {
            sqlx::query(
                r#"
                INSERT INTO buses (id, operator, from_city_id, to_city_id, departure_time, arrival_time, duration, fare, rating)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(bus.id)
            .bind(&bus.operator)
            .bind(bus.from_city_id)
            .bind(bus.to_city_id)
            .bind(&bus.departure_time)
            .bind(&bus.arrival_time)
            .bind(&bus.duration)
            .bind(bus.fare)
            .bind(bus.rating)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        }

        for seat in &seed.seats {
            sqlx::query("INSERT INTO seats (id, bus_id, seat_no, seat_type, price) VALUES ($1, $2, $3, $4, $5)")
                .bind(seat.id)
                .bind(seat.bus_id)
                .bind(&seat.seat_no)
                .bind(&seat.seat_type)
                .bind(seat.price)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }

        for trip in &seed.trips {
            sqlx::query(
                r#"
                INSERT INTO trips (id, bus_id, service_date, departure_time, arrival_time, status)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(trip.id)
            .bind(trip.bus_id)
            .bind(trip.service_date)
            .bind(&trip.departure_time)
            .bind(&trip.arrival_time)
            .bind(trip.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;
        tracing::info!(
            "Seeded catalog: {} cities, {} buses, {} seats, {} trips",
            seed.cities.len(), seed.buses.len(), seed.seats.len(), seed.trips.len()
        );
        Ok(())
    }
}
