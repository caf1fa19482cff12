//! Item catalog routes

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::items;
use crate::state::AppState;

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/api/items", get(items::list_items))
        .route("/api/items", post(items::create_item))
        .route("/api/items/:id", get(items::get_item))
        .route("/api/items/:id", put(items::update_item))
        .route("/api/items/:id/availability", post(items::set_availability))
}
