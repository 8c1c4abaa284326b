use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::reject;
use crate::models::{Movie, SeatId, Showing};
use crate::search::MovieQuery;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(search_movies))
        .route("/movies/{movie_id}/showings", get(get_showings))
        .route("/showings/{showing_id}/seats", get(get_available_seats))
        .route("/showings/{showing_id}/quote", post(quote_seats))
}

#[derive(Debug, Serialize)]
struct MoviesResponse {
    movies: Vec<Movie>,
    count: usize,
}

// GET /api/movies?query=&date=
async fn search_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MovieQuery>,
) -> impl IntoResponse {
    let movies = state.ledger.search_with(&params);
    Json(MoviesResponse {
        count: movies.len(),
        movies,
    })
}

// GET /api/movies/{movie_id}/showings
async fn get_showings(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<String>,
) -> Result<Json<Vec<Showing>>, (StatusCode, String)> {
    state.ledger.showings(&movie_id).map(Json).map_err(reject)
}

#[derive(Debug, Serialize)]
struct AvailableSeatsResponse {
    showing_id: String,
    available: usize,
    seats: Vec<SeatId>,
}

// GET /api/showings/{showing_id}/seats
async fn get_available_seats(
    State(state): State<Arc<AppState>>,
    Path(showing_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let seats: Vec<SeatId> = state
        .ledger
        .available_seats(&showing_id)
        .await
        .map_err(reject)?
        .into_iter()
        .collect();

    Ok(Json(AvailableSeatsResponse {
        showing_id,
        available: seats.len(),
        seats,
    }))
}

#[derive(Debug, Deserialize)]
struct QuoteRequest {
    seats: Vec<SeatId>,
    #[serde(default)]
    student: bool,
}

// POST /api/showings/{showing_id}/quote
async fn quote_seats(
    State(state): State<Arc<AppState>>,
    Path(showing_id): Path<String>,
    Json(req): Json<QuoteRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let quote = state
        .ledger
        .quote(&showing_id, &req.seats, req.student)
        .map_err(reject)?;
    Ok(Json(quote))
}
