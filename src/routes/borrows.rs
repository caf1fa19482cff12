//! Borrow request routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::borrows;
use crate::state::AppState;

pub fn borrow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/borrow-requests", post(borrows::create_request))
        .route("/api/borrow-requests", get(borrows::list_requests))
        .route("/api/borrow-requests/:id", get(borrows::get_request))
        .route(
            "/api/borrow-requests/:id/negotiations",
            post(borrows::propose_price),
        )
        .route(
            "/api/borrow-requests/:id/negotiations",
            get(borrows::list_negotiations),
        )
        .route("/api/borrow-requests/:id/approve", post(borrows::approve))
        .route("/api/borrow-requests/:id/reject", post(borrows::reject))
        .route("/api/borrow-requests/:id/cancel", post(borrows::cancel))
        .route(
            "/api/borrow-requests/:id/payment-session",
            post(borrows::create_payment_session),
        )
        .route("/api/borrow-requests/:id/activate", post(borrows::activate))
        .route("/api/borrow-requests/:id/complete", post(borrows::complete))
}
