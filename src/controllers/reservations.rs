use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::reject;
use crate::ledger::BookingRequest;
use crate::models::SeatId;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reservations", get(get_customer_reservations).post(create_reservation))
        .route("/reservations/cancel", patch(cancel_reservation))
        .route("/reservations/{reservation_id}", get(get_reservation))
}

/* ---------- RESERVATIONS ---------- */

// POST /api/reservations
#[derive(Debug, Deserialize)]
struct CreateReservationRequest {
    showing_id: String,
    seats: Vec<SeatId>,
    customer_ref: String,
    #[serde(default)]
    student: bool,
}

async fn create_reservation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let request = BookingRequest::new(req.showing_id, req.seats, req.customer_ref).student(req.student);
    let reservation = state.ledger.book_with(request).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

// GET /api/reservations?customer_ref=
#[derive(Debug, Deserialize)]
struct CustomerQuery {
    customer_ref: String,
}

async fn get_customer_reservations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CustomerQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if params.customer_ref.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "customer_ref must not be blank".to_string()));
    }
    Ok(Json(state.ledger.list_reservations(&params.customer_ref).await))
}

// GET /api/reservations/{reservation_id}
async fn get_reservation(
    State(state): State<Arc<AppState>>,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let reservation = state.ledger.get_reservation(reservation_id).await.map_err(reject)?;
    Ok(Json(reservation))
}

// PATCH /api/reservations/cancel
#[derive(Debug, Deserialize)]
struct CancelReservationRequest {
    reservation_id: Uuid,
}

async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CancelReservationRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state.ledger.cancel(req.reservation_id).await.map_err(reject)?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Reservation cancelled", "reservation_id": req.reservation_id})),
    ))
}
