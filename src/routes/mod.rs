use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{self, health_check};
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/events",
            get(handlers::events::list_events).post(handlers::events::create_event),
        )
        .route("/api/events/:id", get(handlers::events::get_event))
        .route("/api/me/tickets", get(handlers::tickets::my_tickets))
        .route("/api/checkout", post(handlers::checkout::process_checkout))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
        .with_state(state)
}
