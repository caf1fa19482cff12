//! Notification routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::notifications;
use crate::state::AppState;

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route("/api/notifications/:id/read", post(notifications::mark_read))
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
}
