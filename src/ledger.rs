//! Леджер бронирований.
//!
//! Единственный владелец занятости мест и статусов броней. Все изменения идут
//! под одним замком: проверка мест, запись в хранилище и обновление памяти
//! выполняются как одна операция, поэтому два параллельных `book` на одно
//! место не могут пройти оба. Если хранилище вернуло ошибку, память не
//! меняется.

use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::{LedgerError, Resource, StoreError};
use crate::models::{Movie, Reservation, ReservationStatus, SeatId, Showing};
use crate::pricing::{PricingPolicy, Quote};
use crate::search::{search_movies, MovieQuery};
use crate::store::ReservationStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub showing_id: String,
    pub seats: Vec<SeatId>,
    pub customer_ref: String,
    pub student: bool,
}

impl BookingRequest {
    pub fn new(showing_id: impl Into<String>, seats: impl IntoIterator<Item = SeatId>, customer_ref: impl Into<String>) -> Self {
        Self {
            showing_id: showing_id.into(),
            seats: seats.into_iter().collect(),
            customer_ref: customer_ref.into(),
            student: false,
        }
    }

    pub fn student(mut self, student: bool) -> Self {
        self.student = student;
        self
    }
}

/// Статистика заполненности сеанса.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub showing_id: String,
    pub total_seats: usize,
    pub booked_seats: usize,
    pub free_seats: usize,
    pub active_reservations: usize,
    pub cancelled_reservations: usize,
    pub revenue: i64,
}

#[derive(Debug, Default)]
struct LedgerState {
    reservations: HashMap<Uuid, Reservation>,
    // порядок создания броней
    order: Vec<Uuid>,
    by_customer: HashMap<String, Vec<Uuid>>,
    // showing_id -> место -> бронь, которая его держит
    held: HashMap<String, HashMap<SeatId, Uuid>>,
}

impl LedgerState {
    fn holders(&self, showing_id: &str) -> Option<&HashMap<SeatId, Uuid>> {
        self.held.get(showing_id)
    }

    fn taken<'a>(&self, showing_id: &str, seats: impl IntoIterator<Item = &'a SeatId>) -> Vec<SeatId> {
        match self.holders(showing_id) {
            Some(holders) => seats.into_iter().filter(|s| holders.contains_key(s)).copied().collect(),
            None => Vec::new(),
        }
    }

    fn insert(&mut self, reservation: Reservation) {
        if reservation.is_active() {
            let holders = self.held.entry(reservation.showing_id.clone()).or_default();
            for seat in &reservation.seats {
                holders.insert(*seat, reservation.id);
            }
        }
        self.order.push(reservation.id);
        self.by_customer
            .entry(reservation.customer_ref.clone())
            .or_default()
            .push(reservation.id);
        self.reservations.insert(reservation.id, reservation);
    }

    fn release(&mut self, cancelled: Reservation) {
        if let Some(holders) = self.held.get_mut(&cancelled.showing_id) {
            for seat in &cancelled.seats {
                if holders.get(seat) == Some(&cancelled.id) {
                    holders.remove(seat);
                }
            }
        }
        self.reservations.insert(cancelled.id, cancelled);
    }
}

// Postgres TIMESTAMP хранит микросекунды
fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

pub struct Ledger {
    catalog: Catalog,
    pricing: PricingPolicy,
    store: Arc<dyn ReservationStore>,
    state: Mutex<LedgerState>,
}

impl Ledger {
    /// Поднимает леджер из хранилища.
    ///
    /// Каталог берется из хранилища, а если его там нет - используется
    /// `fallback`, который сразу сохраняется в хранилище. Брони
    /// проигрываются в порядке создания; снимок, где две активные брони
    /// делят место или бронь ссылается на несуществующий сеанс, отвергается.
    pub async fn load(
        store: Arc<dyn ReservationStore>,
        fallback: Catalog,
        pricing: PricingPolicy,
    ) -> Result<Self, LedgerError> {
        let catalog = match store.load_catalog().await? {
            Some(catalog) => catalog,
            None => {
                store.save_catalog(&fallback).await?;
                fallback
            }
        };

        let mut state = LedgerState::default();
        let reservations = store.load_reservations().await?;
        let total = reservations.len();
        for reservation in reservations {
            Self::check_restored(&catalog, &state, &reservation)?;
            state.insert(reservation);
        }

        info!(
            "Ledger loaded: {} movies, {} showings, {} reservations",
            catalog.movies().len(),
            catalog.showings().len(),
            total
        );

        Ok(Self {
            catalog,
            pricing,
            store,
            state: Mutex::new(state),
        })
    }

    fn check_restored(catalog: &Catalog, state: &LedgerState, reservation: &Reservation) -> Result<(), LedgerError> {
        let showing = catalog.showing(&reservation.showing_id).ok_or_else(|| {
            LedgerError::CorruptState(format!(
                "reservation {} refers to unknown showing '{}'",
                reservation.id, reservation.showing_id
            ))
        })?;
        if reservation.seats.is_empty() {
            return Err(LedgerError::CorruptState(format!("reservation {} holds no seats", reservation.id)));
        }
        if let Some(seat) = reservation.seats.iter().find(|s| !showing.contains(**s)) {
            return Err(LedgerError::CorruptState(format!(
                "reservation {} holds seat {} outside showing '{}'",
                reservation.id, seat, showing.id
            )));
        }
        if state.reservations.contains_key(&reservation.id) {
            return Err(LedgerError::CorruptState(format!("reservation {} is stored twice", reservation.id)));
        }
        if reservation.is_active() {
            let taken = state.taken(&reservation.showing_id, &reservation.seats);
            if !taken.is_empty() {
                return Err(LedgerError::CorruptState(format!(
                    "reservation {} double-books seats {:?} in showing '{}'",
                    reservation.id, taken, reservation.showing_id
                )));
            }
        }
        Ok(())
    }

    pub fn list_movies(&self) -> &[Movie] {
        self.catalog.movies()
    }

    pub fn search(&self, query: &str) -> Vec<Movie> {
        self.search_with(&MovieQuery::text(query))
    }

    pub fn search_with(&self, query: &MovieQuery) -> Vec<Movie> {
        search_movies(&self.catalog, query).into_iter().cloned().collect()
    }

    pub fn showings(&self, movie_id: &str) -> Result<Vec<Showing>, LedgerError> {
        if self.catalog.movie(movie_id).is_none() {
            return Err(LedgerError::not_found(Resource::Movie, movie_id));
        }
        Ok(self.catalog.showings_of(movie_id).into_iter().cloned().collect())
    }

    fn showing(&self, showing_id: &str) -> Result<&Showing, LedgerError> {
        self.catalog
            .showing(showing_id)
            .ok_or_else(|| LedgerError::not_found(Resource::Showing, showing_id))
    }

    /// Проверка запроса мест без учета занятости: сеанс существует, запрос
    /// не пуст, все места из рассадки. Дубликаты схлопываются.
    fn validate_seats(&self, showing_id: &str, seats: &[SeatId]) -> Result<BTreeSet<SeatId>, LedgerError> {
        let showing = self.showing(showing_id)?;
        if seats.is_empty() {
            return Err(LedgerError::EmptyBooking);
        }
        let requested: BTreeSet<SeatId> = seats.iter().copied().collect();
        if let Some(seat) = requested.iter().find(|s| !showing.contains(**s)) {
            return Err(LedgerError::InvalidSeat {
                showing_id: showing_id.to_string(),
                seat: *seat,
            });
        }
        Ok(requested)
    }

    pub async fn available_seats(&self, showing_id: &str) -> Result<BTreeSet<SeatId>, LedgerError> {
        let showing = self.showing(showing_id)?;
        let state = self.state.lock().await;
        let holders = state.holders(showing_id);
        Ok(showing
            .seats()
            .filter(|seat| holders.map_or(true, |h| !h.contains_key(seat)))
            .collect())
    }

    pub fn quote(&self, showing_id: &str, seats: &[SeatId], student: bool) -> Result<Quote, LedgerError> {
        let requested = self.validate_seats(showing_id, seats)?;
        Ok(self.pricing.quote(showing_id, &requested, student))
    }

    pub async fn book(&self, showing_id: &str, seats: &[SeatId], customer_ref: &str) -> Result<Reservation, LedgerError> {
        self.book_with(BookingRequest::new(showing_id, seats.iter().copied(), customer_ref))
            .await
    }

    pub async fn book_with(&self, request: BookingRequest) -> Result<Reservation, LedgerError> {
        let customer_ref = request.customer_ref.trim();
        if customer_ref.is_empty() {
            return Err(LedgerError::InvalidCustomer);
        }
        let requested = self.validate_seats(&request.showing_id, &request.seats)?;
        let quote = self.pricing.quote(&request.showing_id, &requested, request.student);

        let mut state = self.state.lock().await;

        let taken = state.taken(&request.showing_id, &requested);
        if !taken.is_empty() {
            debug!("Seats {:?} of showing {} are taken", taken, request.showing_id);
            return Err(LedgerError::SeatUnavailable {
                showing_id: request.showing_id,
                seats: taken,
            });
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            showing_id: request.showing_id,
            customer_ref: customer_ref.to_string(),
            status: ReservationStatus::Active,
            seats: requested,
            student: request.student,
            total_price: quote.total,
            created_at: now(),
            cancelled_at: None,
        };

        match self.store.insert_reservation(&reservation).await {
            Ok(()) => {}
            Err(StoreError::SeatConflict) => {
                // место занято в хранилище кем-то вне этого процесса
                warn!("Store rejected reservation for showing {}: seat conflict", reservation.showing_id);
                return Err(LedgerError::SeatUnavailable {
                    showing_id: reservation.showing_id,
                    seats: reservation.seats.into_iter().collect(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            "Reservation {} created: showing={}, customer={}, seats={}, total={}",
            reservation.id,
            reservation.showing_id,
            reservation.customer_ref,
            reservation.seats.len(),
            reservation.total_price
        );
        state.insert(reservation.clone());
        Ok(reservation)
    }

    pub async fn cancel(&self, reservation_id: Uuid) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;

        let cancelled = match state.reservations.get(&reservation_id) {
            Some(r) if r.is_active() => r.cancelled(now()),
            _ => return Err(LedgerError::not_found(Resource::Reservation, reservation_id)),
        };

        self.store.mark_cancelled(&cancelled).await?;

        info!(
            "Reservation {} cancelled, {} seats released in showing {}",
            cancelled.id,
            cancelled.seats.len(),
            cancelled.showing_id
        );
        state.release(cancelled);
        Ok(())
    }

    pub async fn get_reservation(&self, reservation_id: Uuid) -> Result<Reservation, LedgerError> {
        self.state
            .lock()
            .await
            .reservations
            .get(&reservation_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(Resource::Reservation, reservation_id))
    }

    /// Все брони клиента (любой статус) в порядке создания.
    pub async fn list_reservations(&self, customer_ref: &str) -> Vec<Reservation> {
        let state = self.state.lock().await;
        state
            .by_customer
            .get(customer_ref.trim())
            .map(|ids| ids.iter().filter_map(|id| state.reservations.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    pub async fn occupancy(&self, showing_id: &str) -> Result<Occupancy, LedgerError> {
        let showing = self.showing(showing_id)?;
        let state = self.state.lock().await;

        let mut occupancy = Occupancy {
            showing_id: showing_id.to_string(),
            total_seats: showing.capacity(),
            booked_seats: state.holders(showing_id).map_or(0, HashMap::len),
            free_seats: 0,
            active_reservations: 0,
            cancelled_reservations: 0,
            revenue: 0,
        };
        occupancy.free_seats = occupancy.total_seats - occupancy.booked_seats;

        for id in &state.order {
            let Some(reservation) = state.reservations.get(id) else { continue };
            if reservation.showing_id != showing_id {
                continue;
            }
            match reservation.status {
                ReservationStatus::Active => {
                    occupancy.active_reservations += 1;
                    occupancy.revenue += reservation.total_price;
                }
                ReservationStatus::Cancelled => occupancy.cancelled_reservations += 1,
            }
        }

        Ok(occupancy)
    }

    /// Сброс хранилища при остановке.
    pub async fn flush(&self) -> Result<(), LedgerError> {
        // держим замок, чтобы не писать параллельно с изменениями
        let _state = self.state.lock().await;
        self.store.flush().await?;
        info!("Ledger flushed");
        Ok(())
    }
}
