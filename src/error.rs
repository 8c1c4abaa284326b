use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::SeatId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Movie,
    Showing,
    Reservation,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Movie => "movie",
            Resource::Showing => "showing",
            Resource::Reservation => "reservation",
        })
    }
}

/// Ошибки операций леджера. Любая ошибка оставляет состояние без изменений.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{resource} '{id}' not found")]
    NotFound { resource: Resource, id: String },

    #[error("seat {seat} does not exist in showing '{showing_id}'")]
    InvalidSeat { showing_id: String, seat: SeatId },

    /// `seats` - именно занятые места, если конфликт найден в памяти. Если же
    /// хранилище отклонило вставку (`StoreError::SeatConflict`), какие места
    /// заняты неизвестно, и в списке все запрошенные.
    #[error("seats already taken in showing '{showing_id}': {}", format_seats(.seats))]
    SeatUnavailable { showing_id: String, seats: Vec<SeatId> },

    #[error("a booking must request at least one seat")]
    EmptyBooking,

    #[error("customer reference must not be blank")]
    InvalidCustomer,

    #[error("stored reservations are inconsistent: {0}")]
    CorruptState(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    pub fn not_found(resource: Resource, id: impl ToString) -> Self {
        LedgerError::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

fn format_seats(seats: &[SeatId]) -> String {
    seats.iter().map(SeatId::to_string).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("stored catalog is invalid: {0}")]
    Catalog(#[from] CatalogError),

    #[error("stored record is invalid: {0}")]
    Corrupt(String),

    /// Место уже занято другой активной бронью на уровне хранилища.
    #[error("seat is already held in storage")]
    SeatConflict,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{resource} id must not be blank")]
    BlankId { resource: Resource },

    #[error("duplicate {resource} id '{id}'")]
    Duplicate { resource: Resource, id: String },

    #[error("showing '{showing_id}' refers to unknown movie '{movie_id}'")]
    UnknownMovie { showing_id: String, movie_id: String },

    #[error("showing '{showing_id}' has an empty seat layout")]
    EmptyLayout { showing_id: String },

    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}
