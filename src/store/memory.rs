use async_trait::async_trait;
use tokio::sync::Mutex;

use super::ReservationStore;
use crate::catalog::Catalog;
use crate::error::StoreError;
use crate::models::Reservation;

/// Хранилище в памяти процесса. Для тестов и демо-режима.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    catalog: Option<Catalog>,
    reservations: Vec<Reservation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                catalog: Some(catalog),
                reservations: Vec::new(),
            }),
        }
    }

    pub async fn reservations(&self) -> Vec<Reservation> {
        self.inner.lock().await.reservations.clone()
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn load_catalog(&self) -> Result<Option<Catalog>, StoreError> {
        Ok(self.inner.lock().await.catalog.clone())
    }

    async fn save_catalog(&self, catalog: &Catalog) -> Result<(), StoreError> {
        self.inner.lock().await.catalog = Some(catalog.clone());
        Ok(())
    }

    async fn load_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        Ok(self.inner.lock().await.reservations.clone())
    }

    async fn insert_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        self.inner.lock().await.reservations.push(reservation.clone());
        Ok(())
    }

    async fn mark_cancelled(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.reservations.iter_mut().find(|r| r.id == reservation.id) {
            Some(stored) => {
                *stored = reservation.clone();
                Ok(())
            }
            None => Err(StoreError::Corrupt(format!(
                "reservation {} is not in the store",
                reservation.id
            ))),
        }
    }
}
