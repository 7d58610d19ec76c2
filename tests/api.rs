//! Router-level integration tests: request in, envelope out, store state
//! checked through the same `DocumentStore` handle the app uses.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use tessera_server::extract::USER_ID_HEADER;
use tessera_server::routes::{create_routes, AppState};
use tessera_server::store::{as_count, DocumentStore, MemoryStore, StorePath};

fn app_with_seed() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::with_root(json!({
        "events": {
            "ev1": {
                "title": "Summer Music Festival",
                "category": "Music",
                "date": "2024-07-15",
                "location": "Central Park",
                "ticketTiers": [
                    { "name": "General", "price": 20.0, "availableTickets": 10 },
                    { "name": "VIP", "price": 80.0, "availableTickets": 5 }
                ]
            },
            "ev2": {
                "title": "Tech Conference",
                "ticketTiers": [
                    { "name": "Standard Ticket", "price": 0.0, "availableTickets": "12" }
                ]
            }
        },
        "users": {}
    })));
    let router = create_routes(AppState {
        store: store.clone(),
    });
    (store, router)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_as(uri: &str, user_id: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(USER_ID_HEADER, user_id)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, user_id: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user_id) = user_id {
        builder = builder.header(USER_ID_HEADER, user_id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn count_at(store: &MemoryStore, raw: &str) -> u64 {
    let path = StorePath::parse(raw).unwrap();
    as_count(store.read(&path).await.unwrap().as_ref())
}

#[tokio::test]
async fn health_is_public() {
    let (_, app) = app_with_seed();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["service"], "tessera-api");
}

#[tokio::test]
async fn events_are_listed_with_their_ids() {
    let (_, app) = app_with_seed();

    let response = app.oneshot(get("/api/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let events = body["data"].as_array().unwrap();
    assert_eq!(events.len(), 2);

    let titles: Vec<&str> = events
        .iter()
        .map(|event| event["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Summer Music Festival"));
    assert!(titles.contains(&"Tech Conference"));
    assert!(events.iter().all(|event| event["id"].is_string()));
}

#[tokio::test]
async fn event_detail_includes_tiers() {
    let (_, app) = app_with_seed();

    let response = app.oneshot(get("/api/events/ev1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Summer Music Festival");
    assert_eq!(body["data"]["ticketTiers"][1]["name"], "VIP");
}

#[tokio::test]
async fn unknown_event_is_a_not_found_envelope() {
    let (_, app) = app_with_seed();

    let response = app.oneshot(get("/api/events/ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn checkout_requires_authentication() {
    let (store, app) = app_with_seed();

    let request = post_json(
        "/api/checkout",
        None,
        &json!({ "items": [{ "eventId": "ev1", "quantity": 1 }] }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_ERROR");
    assert_eq!(
        count_at(&store, "events/ev1/ticketTiers/0/availableTickets").await,
        10
    );
}

#[tokio::test]
async fn checkout_decrements_inventory_and_shows_up_in_my_tickets() {
    let (store, app) = app_with_seed();

    let request = post_json(
        "/api/checkout",
        Some("u1"),
        &json!({
            "items": [
                { "eventId": "ev1", "tierName": "General", "quantity": 4, "unitPrice": 20.0 }
            ]
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    assert_eq!(
        count_at(&store, "events/ev1/ticketTiers/0/availableTickets").await,
        6
    );
    assert_eq!(count_at(&store, "users/u1/purchasedTickets/ev1").await, 4);

    let response = app.oneshot(get_as("/api/me/tickets", "u1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let holdings = body["data"].as_array().unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0]["eventId"], "ev1");
    assert_eq!(holdings[0]["title"], "Summer Music Festival");
    assert_eq!(holdings[0]["quantity"], 4);
}

#[tokio::test]
async fn failed_checkout_reports_every_problem_and_writes_nothing() {
    let (store, app) = app_with_seed();

    let request = post_json(
        "/api/checkout",
        Some("u1"),
        &json!({
            "items": [
                { "eventId": "ev1", "tierName": "General", "quantity": 99 },
                { "eventId": "ghost", "quantity": 1 }
            ]
        }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CHECKOUT_REJECTED");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.starts_with("Checkout failed: "));
    assert!(message.contains("not enough tickets available for Summer Music Festival"));
    assert!(message.contains("event ghost not found"));

    assert_eq!(
        count_at(&store, "events/ev1/ticketTiers/0/availableTickets").await,
        10
    );
    assert_eq!(count_at(&store, "users/u1/purchasedTickets/ev1").await, 0);
}

#[tokio::test]
async fn jointly_oversized_items_fail_as_a_whole() {
    let (store, app) = app_with_seed();

    // VIP availability is 5; each item alone fits.
    let request = post_json(
        "/api/checkout",
        Some("u1"),
        &json!({
            "items": [
                { "eventId": "ev1", "tierName": "VIP", "quantity": 3 },
                { "eventId": "ev1", "tierName": "VIP", "quantity": 3 }
            ]
        }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(
        count_at(&store, "events/ev1/ticketTiers/1/availableTickets").await,
        5
    );
}

#[tokio::test]
async fn created_event_is_readable_with_a_standard_tier() {
    let (_, app) = app_with_seed();

    let request = post_json(
        "/api/events",
        Some("org-7"),
        &json!({
            "title": "Open Mic Night",
            "category": "Comedy",
            "date": "2026-09-01",
            "location": "The Basement",
            "price": 5.0,
            "availableTickets": 40
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get(&format!("/api/events/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["organizerId"], "org-7");
    assert_eq!(body["data"]["ticketTiers"][0]["name"], "Standard Ticket");
    assert_eq!(body["data"]["ticketTiers"][0]["availableTickets"], 40);
}

#[tokio::test]
async fn event_creation_validates_payload() {
    let (_, app) = app_with_seed();

    let request = post_json("/api/events", Some("org-7"), &json!({ "title": "No Price" }));
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let request = post_json("/api/events", None, &json!({ "title": "x", "price": 1.0 }));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn security_headers_are_present_on_responses() {
    let (_, app) = app_with_seed();

    let response = app.oneshot(get("/health")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.get("x-request-id").is_some());
}
