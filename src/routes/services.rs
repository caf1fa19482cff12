//! Service catalog routes

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::services;
use crate::state::AppState;

pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/api/services", get(services::list_services))
        .route("/api/services", post(services::create_service))
        .route("/api/services/:id", get(services::get_service))
        .route("/api/services/:id", put(services::update_service))
        .route("/api/services/:id/active", post(services::set_active))
        .route("/api/services/:id/calendar", get(services::day_calendar))
}
