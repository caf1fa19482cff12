//! Direct message routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::messages;
use crate::state::AppState;

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/api/messages", post(messages::send_message))
        .route("/api/messages/conversations", get(messages::list_conversations))
        .route("/api/messages/with/:peer", get(messages::conversation_with))
        .route("/api/messages/unread-count", get(messages::unread_count))
}
