//! Service booking routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::bookings;
use crate::state::AppState;

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings", get(bookings::list_bookings))
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route("/api/bookings/:id/respond", post(bookings::respond))
        .route("/api/bookings/:id/start", post(bookings::start))
        .route("/api/bookings/:id/complete", post(bookings::complete))
        .route("/api/bookings/:id/cancel", post(bookings::cancel))
        .route("/api/bookings/:id/review", post(bookings::review))
}
