use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::ReservationStore;
use crate::catalog::Catalog;
use crate::error::StoreError;
use crate::models::Reservation;

/// Хранилище в одном JSON-файле.
///
/// Каждое изменение переписывает снимок целиком: сначала во временный файл
/// рядом, затем `rename` поверх основного. Снимок в памяти заменяется только
/// после успешного `rename`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    snapshot: Mutex<Snapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    catalog: Option<Catalog>,
    #[serde(default)]
    reservations: Vec<Reservation>,
}

impl FileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = match tokio::fs::read_to_string(&path).await {
            Ok(data) => {
                let snapshot: Snapshot = serde_json::from_str(&data)?;
                info!(
                    "Loaded {} reservations from {}",
                    snapshot.reservations.len(),
                    path.display()
                );
                snapshot
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Bookings file {} not found, starting empty", path.display());
                Snapshot::default()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Self {
            path,
            snapshot: Mutex::new(snapshot),
        })
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(parent, source))?;
        }
        tokio::fs::write(&tmp, data)
            .await
            .map_err(|source| self.io_error(&tmp, source))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| self.io_error(&self.path, source))?;

        debug!("Snapshot written to {}", self.path.display());
        Ok(())
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    // Изменить копию снимка, записать на диск и только потом подменить
    async fn update<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Snapshot) -> Result<(), StoreError> + Send,
    {
        let mut current = self.snapshot.lock().await;
        let mut next = current.clone();
        change(&mut next)?;
        self.persist(&next).await?;
        *current = next;
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for FileStore {
    async fn load_catalog(&self) -> Result<Option<Catalog>, StoreError> {
        Ok(self.snapshot.lock().await.catalog.clone())
    }

    async fn save_catalog(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let catalog = catalog.clone();
        self.update(move |s| {
            s.catalog = Some(catalog);
            Ok(())
        })
        .await
    }

    async fn load_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        Ok(self.snapshot.lock().await.reservations.clone())
    }

    async fn insert_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let reservation = reservation.clone();
        self.update(move |s| {
            s.reservations.push(reservation);
            Ok(())
        })
        .await
    }

    async fn mark_cancelled(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let reservation = reservation.clone();
        self.update(move |s| {
            let stored = s
                .reservations
                .iter_mut()
                .find(|r| r.id == reservation.id)
                .ok_or_else(|| StoreError::Corrupt(format!("reservation {} is not in the file", reservation.id)))?;
            *stored = reservation;
            Ok(())
        })
        .await
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let snapshot = self.snapshot.lock().await;
        self.persist(&snapshot).await
    }
}
