use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use super::ReservationStore;
use crate::catalog::Catalog;
use crate::error::StoreError;
use crate::models::{Movie, Reservation, SeatId, Showing};

/// Хранилище в PostgreSQL.
///
/// Занятые места лежат в `held_seats` с первичным ключом
/// `(showing_id, seat_row, seat_number)`: даже при нескольких процессах над
/// одной базой второе занятие места упадет на вставке и превратится в
/// [`StoreError::SeatConflict`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct MovieRow {
    id: String,
    title: String,
    genre: String,
    duration_minutes: i32,
    description: Option<String>,
}

#[derive(FromRow)]
struct ShowingRow {
    id: String,
    movie_id: String,
    starts_at: NaiveDateTime,
    auditorium: String,
    rows: i32,
    seats_per_row: i32,
}

#[derive(FromRow)]
struct ReservationRow {
    id: Uuid,
    showing_id: String,
    customer_ref: String,
    status: String,
    seats: Json<Vec<SeatId>>,
    student: bool,
    total_price: i64,
    created_at: NaiveDateTime,
    cancelled_at: Option<NaiveDateTime>,
}

impl TryFrom<MovieRow> for Movie {
    type Error = StoreError;

    fn try_from(row: MovieRow) -> Result<Self, Self::Error> {
        Ok(Movie {
            duration_minutes: u32::try_from(row.duration_minutes)
                .map_err(|_| StoreError::Corrupt(format!("movie {} has negative duration", row.id)))?,
            id: row.id,
            title: row.title,
            genre: row.genre,
            description: row.description,
        })
    }
}

impl TryFrom<ShowingRow> for Showing {
    type Error = StoreError;

    fn try_from(row: ShowingRow) -> Result<Self, Self::Error> {
        let layout = |value: i32| {
            u16::try_from(value).map_err(|_| StoreError::Corrupt(format!("showing {} has invalid layout", row.id)))
        };
        Ok(Showing {
            rows: layout(row.rows)?,
            seats_per_row: layout(row.seats_per_row)?,
            id: row.id,
            movie_id: row.movie_id,
            starts_at: row.starts_at,
            auditorium: row.auditorium,
        })
    }
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Reservation {
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            id: row.id,
            showing_id: row.showing_id,
            customer_ref: row.customer_ref,
            seats: row.seats.0.into_iter().collect::<BTreeSet<_>>(),
            student: row.student,
            total_price: row.total_price,
            created_at: row.created_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StoreError::SeatConflict,
        _ => StoreError::Database(e),
    }
}

impl PgStore {
    pub async fn connect(database_url: &str, pool_size: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        info!("Migrations completed");
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn load_catalog(&self) -> Result<Option<Catalog>, StoreError> {
        let movies = sqlx::query_as::<_, MovieRow>(
            "SELECT id, title, genre, duration_minutes, description FROM movies ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;

        if movies.is_empty() {
            return Ok(None);
        }

        let showings = sqlx::query_as::<_, ShowingRow>(
            "SELECT id, movie_id, starts_at, auditorium, rows, seats_per_row FROM showings ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;

        let movies = movies.into_iter().map(Movie::try_from).collect::<Result<Vec<_>, _>>()?;
        let showings = showings.into_iter().map(Showing::try_from).collect::<Result<Vec<_>, _>>()?;
        info!("Loaded catalog from database: {} movies, {} showings", movies.len(), showings.len());

        Ok(Some(Catalog::new(movies, showings)?))
    }

    async fn save_catalog(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for movie in catalog.movies() {
            sqlx::query(
                "INSERT INTO movies (id, title, genre, duration_minutes, description)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(&movie.id)
            .bind(&movie.title)
            .bind(&movie.genre)
            .bind(i32::try_from(movie.duration_minutes).unwrap_or(i32::MAX))
            .bind(&movie.description)
            .execute(&mut *tx)
            .await?;
        }

        for showing in catalog.showings() {
            sqlx::query(
                "INSERT INTO showings (id, movie_id, starts_at, auditorium, rows, seats_per_row)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(&showing.id)
            .bind(&showing.movie_id)
            .bind(showing.starts_at)
            .bind(&showing.auditorium)
            .bind(i32::from(showing.rows))
            .bind(i32::from(showing.seats_per_row))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            "Seeded catalog into database: {} movies, {} showings",
            catalog.movies().len(),
            catalog.showings().len()
        );
        Ok(())
    }

    async fn load_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, showing_id, customer_ref, status, seats, student,
                   total_price, created_at, cancelled_at
            FROM reservations
            ORDER BY seq
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Reservation::try_from)
        .collect()
    }

    async fn insert_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let seats: Vec<SeatId> = reservation.seats.iter().copied().collect();

        sqlx::query(
            r#"
            INSERT INTO reservations
                (id, showing_id, customer_ref, status, seats, student, total_price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reservation.id)
        .bind(&reservation.showing_id)
        .bind(&reservation.customer_ref)
        .bind(reservation.status.as_str())
        .bind(Json(&seats))
        .bind(reservation.student)
        .bind(reservation.total_price)
        .bind(reservation.created_at)
        .execute(&mut *tx)
        .await?;

        for seat in &seats {
            let inserted = sqlx::query(
                "INSERT INTO held_seats (showing_id, seat_row, seat_number, reservation_id)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(&reservation.showing_id)
            .bind(i32::from(seat.row))
            .bind(i32::from(seat.number))
            .bind(reservation.id)
            .execute(&mut *tx)
            .await;

            if let Err(e) = inserted {
                let err = map_insert_error(e);
                if matches!(err, StoreError::SeatConflict) {
                    warn!("Seat {} of showing {} is already held in database", seat, reservation.showing_id);
                }
                // транзакция откатывается при drop
                return Err(err);
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn mark_cancelled(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE reservations SET status = $2, cancelled_at = $3 WHERE id = $1 AND status = 'ACTIVE'",
        )
        .bind(reservation.id)
        .bind(reservation.status.as_str())
        .bind(reservation.cancelled_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::Corrupt(format!(
                "reservation {} is not active in database",
                reservation.id
            )));
        }

        sqlx::query("DELETE FROM held_seats WHERE reservation_id = $1")
            .bind(reservation.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}
