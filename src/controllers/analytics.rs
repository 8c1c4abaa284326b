//! Статистика заполненности сеанса: места, активные и отмененные брони, выручка.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::reject;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/analytics", get(get_showing_analytics))
}

#[derive(Debug, Deserialize)]
struct AnalyticsQuery {
    showing_id: String,
}

/// GET /api/analytics?showing_id=
async fn get_showing_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let occupancy = state.ledger.occupancy(&params.showing_id).await.map_err(reject)?;
    Ok(Json(occupancy))
}
