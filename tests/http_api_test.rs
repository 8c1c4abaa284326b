//! HTTP API tests against the router with an in-memory ledger.
//!
//! Requests go through `tower::ServiceExt::oneshot`, no socket is opened.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use movie_tickets::catalog::Catalog;
use movie_tickets::config::Config;
use movie_tickets::ledger::Ledger;
use movie_tickets::pricing::PricingPolicy;
use movie_tickets::store::MemoryStore;
use movie_tickets::{router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn app() -> Router {
    let config = Config::from_lookup(|_| None).unwrap();
    let ledger = Ledger::load(Arc::new(MemoryStore::new()), Catalog::demo(), PricingPolicy::default())
        .await
        .unwrap();
    router(AppState::with_ledger(ledger, config))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

#[tokio::test]
async fn test_health_and_banner() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn test_movie_search() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/movies?query=batman", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["movies"][0]["title"], "The Batman");

    let (_, body) = send(&app, Method::GET, "/api/movies?query=zzz", None).await;
    assert_eq!(body["count"], 0);

    let (_, body) = send(&app, Method::GET, "/api/movies", None).await;
    assert_eq!(body["count"], 4);

    let (_, body) = send(&app, Method::GET, "/api/movies?date=2026-11-21", None).await;
    assert_eq!(body["count"], 2);

    let (status, body) = send(&app, Method::GET, "/api/movies?query=&date=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 4);

    let (status, _) = send(&app, Method::GET, "/api/movies?date=tomorrow", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_showings_of_movie() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/movies/the-batman/showings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["id"], "batman-1");

    let (status, _) = send(&app, Method::GET, "/api/movies/ghost/showings", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_flow_over_http() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/reservations",
        Some(json!({
            "showing_id": "batman-1",
            "seats": [{"row": 1, "number": 1}, {"row": 1, "number": 2}],
            "customer_ref": "alice"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "ACTIVE");
    assert_eq!(body["total_price"], 300);
    let reservation_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/reservations",
        Some(json!({
            "showing_id": "batman-1",
            "seats": [{"row": 1, "number": 2}, {"row": 1, "number": 3}],
            "customer_ref": "bob"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.as_str().unwrap().contains("R1-S2"));

    let (_, body) = send(&app, Method::GET, "/api/showings/batman-1/seats", None).await;
    assert_eq!(body["available"], 48);

    let (status, body) = send(&app, Method::GET, &format!("/api/reservations/{reservation_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer_ref"], "alice");

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/reservations/cancel",
        Some(json!({"reservation_id": reservation_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/reservations/cancel",
        Some(json!({"reservation_id": reservation_id})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/api/showings/batman-1/seats", None).await;
    assert_eq!(body["available"], 50);

    let (_, body) = send(&app, Method::GET, "/api/reservations?customer_ref=alice", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["status"], "CANCELLED");
}

#[tokio::test]
async fn test_error_status_mapping() {
    let app = app().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/reservations",
        Some(json!({"showing_id": "nope", "seats": [{"row": 1, "number": 1}], "customer_ref": "a"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/reservations",
        Some(json!({"showing_id": "batman-1", "seats": [{"row": 9, "number": 1}], "customer_ref": "a"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/reservations",
        Some(json!({"showing_id": "batman-1", "seats": [], "customer_ref": "a"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/showings/nope/seats", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/reservations/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quote_and_analytics() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/showings/dune-1/quote",
        Some(json!({"seats": [{"row": 1, "number": 5}, {"row": 3, "number": 5}], "student": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 200);

    send(
        &app,
        Method::POST,
        "/api/reservations",
        Some(json!({"showing_id": "dune-1", "seats": [{"row": 3, "number": 5}], "customer_ref": "eve", "student": true})),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/api/analytics?showing_id=dune-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booked_seats"], 1);
    assert_eq!(body["free_seats"], 49);
    assert_eq!(body["revenue"], 80);
}
