//! Flat-file persistence: reservations and the catalog survive a restart.

#![allow(clippy::unwrap_used)]

use movie_tickets::catalog::Catalog;
use movie_tickets::error::{CatalogError, LedgerError, StoreError};
use movie_tickets::ledger::{BookingRequest, Ledger};
use movie_tickets::models::{ReservationStatus, SeatId};
use movie_tickets::pricing::PricingPolicy;
use movie_tickets::store::{FileStore, ReservationStore};
use std::sync::Arc;
use tempfile::TempDir;

async fn open_ledger(dir: &TempDir) -> Ledger {
    let store = FileStore::open(dir.path().join("bookings.json")).await.unwrap();
    Ledger::load(Arc::new(store), Catalog::demo(), PricingPolicy::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_missing_file_starts_empty_and_seeds_catalog() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bookings.json");
    let store = FileStore::open(&path).await.unwrap();

    assert!(store.load_catalog().await.unwrap().is_none());
    assert!(store.load_reservations().await.unwrap().is_empty());

    let ledger = Ledger::load(Arc::new(store), Catalog::demo(), PricingPolicy::default())
        .await
        .unwrap();
    assert!(path.exists());
    assert_eq!(ledger.list_movies().len(), Catalog::demo().movies().len());
}

#[tokio::test]
async fn test_reservations_survive_restart() {
    let dir = TempDir::new().unwrap();

    let (kept, dropped) = {
        let ledger = open_ledger(&dir).await;
        let kept = ledger
            .book_with(BookingRequest::new("batman-1", [SeatId::new(1, 1), SeatId::new(1, 2)], "alice").student(true))
            .await
            .unwrap();
        let dropped = ledger.book("batman-1", &[SeatId::new(2, 2)], "bob").await.unwrap();
        ledger.cancel(dropped.id).await.unwrap();
        ledger.flush().await.unwrap();
        (kept, dropped)
    };

    let ledger = open_ledger(&dir).await;
    let restored = ledger.get_reservation(kept.id).await.unwrap();
    assert_eq!(restored, kept);
    assert_eq!(restored.total_price, 240);

    let cancelled = ledger.get_reservation(dropped.id).await.unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());

    let available = ledger.available_seats("batman-1").await.unwrap();
    assert_eq!(available.len(), 48);
    assert!(available.contains(&SeatId::new(2, 2)));

    let err = ledger.book("batman-1", &[SeatId::new(1, 2)], "carol").await.unwrap_err();
    assert!(matches!(err, LedgerError::SeatUnavailable { .. }));
}

#[tokio::test]
async fn test_corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bookings.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = FileStore::open(&path).await.unwrap_err();
    assert!(matches!(err, StoreError::Serde(_)));
}

#[tokio::test]
async fn test_catalog_file_is_loaded_from_snapshot_over_fallback() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bookings.json");
    let catalog = Catalog::from_json_str(
        r#"{
            "movies": [{"id": "m1", "title": "Arrival", "genre": "Sci-Fi", "duration_minutes": 116}],
            "showings": [{"id": "s1", "movie_id": "m1", "starts_at": "2026-05-01T20:00:00", "auditorium": "A", "rows": 2, "seats_per_row": 2}]
        }"#,
    )
    .unwrap();

    {
        let store = FileStore::open(&path).await.unwrap();
        store.save_catalog(&catalog).await.unwrap();
    }

    let store = FileStore::open(&path).await.unwrap();
    let ledger = Ledger::load(Arc::new(store), Catalog::demo(), PricingPolicy::default())
        .await
        .unwrap();
    assert_eq!(ledger.list_movies().len(), 1);
    assert_eq!(ledger.search("arrival")[0].id, "m1");
    assert_eq!(ledger.available_seats("s1").await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_catalog_file_loads_and_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    tokio::fs::write(&path, serde_json::to_vec(&Catalog::demo()).unwrap())
        .await
        .unwrap();

    let catalog = Catalog::from_json_file(&path).await.unwrap();
    assert_eq!(catalog.movies().len(), Catalog::demo().movies().len());
    assert!(catalog.showing("dune-1").is_some());

    let err = Catalog::from_json_file(&dir.path().join("absent.json")).await.unwrap_err();
    assert!(matches!(err, CatalogError::Io { .. }));
}
