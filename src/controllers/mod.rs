pub mod analytics;
pub mod movies;
pub mod reservations;

use axum::{http::StatusCode, Router};
use std::sync::Arc;

use crate::error::LedgerError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(movies::routes())
        .merge(reservations::routes())
        .merge(analytics::routes())
}

/// Перевод ошибки леджера в ответ клиенту. Внутренние ошибки логируются,
/// наружу уходит общий текст.
pub(crate) fn reject(err: LedgerError) -> (StatusCode, String) {
    match err {
        LedgerError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        LedgerError::InvalidSeat { .. } | LedgerError::EmptyBooking | LedgerError::InvalidCustomer => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        LedgerError::SeatUnavailable { .. } => (StatusCode::CONFLICT, err.to_string()),
        LedgerError::CorruptState(_) | LedgerError::Catalog(_) | LedgerError::Store(_) => {
            tracing::error!("ledger operation failed: {:?}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal storage error".to_string())
        }
    }
}
