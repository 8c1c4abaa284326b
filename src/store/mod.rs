//! Адаптеры хранения для леджера.
//!
//! Леджер вызывает хранилище под своим замком и меняет память только после
//! успешной записи, поэтому каждая реализация обязана писать атомарно:
//! либо бронь сохранена целиком, либо ничего не изменилось.

use async_trait::async_trait;

use crate::catalog::Catalog;
use crate::error::StoreError;
use crate::models::Reservation;

pub mod file;
pub mod memory;
pub mod postgres;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// `None` - у хранилища нет своего каталога.
    async fn load_catalog(&self) -> Result<Option<Catalog>, StoreError>;

    async fn save_catalog(&self, catalog: &Catalog) -> Result<(), StoreError>;

    /// Все брони в порядке создания.
    async fn load_reservations(&self) -> Result<Vec<Reservation>, StoreError>;

    async fn insert_reservation(&self, reservation: &Reservation) -> Result<(), StoreError>;

    /// Получает бронь уже в статусе CANCELLED.
    async fn mark_cancelled(&self, reservation: &Reservation) -> Result<(), StoreError>;

    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
