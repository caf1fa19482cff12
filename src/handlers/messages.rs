//! Direct message HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::chat::{ChatMessage, ConversationSummary, SendMessageRequest, UnreadMessages};
use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{PaginatedResponse, PaginationParams};
use crate::state::AppState;

/// POST /api/messages - Send a direct message
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
    let message = state.chat_service.send(user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/messages/conversations - Inbox overview
pub async fn list_conversations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let conversations = state.chat_service.conversations(user.user_id).await?;
    Ok(Json(conversations))
}

/// GET /api/messages/with/:peer - The thread with one peer (marks read)
pub async fn conversation_with(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(peer_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<ChatMessage>>, ApiError> {
    let messages = state
        .chat_service
        .conversation_with(user.user_id, peer_id, pagination)
        .await?;
    Ok(Json(messages))
}

/// GET /api/messages/unread-count - Badge count
pub async fn unread_count(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UnreadMessages>, ApiError> {
    let unread = state.chat_service.unread_count(user.user_id).await?;
    Ok(Json(UnreadMessages { unread }))
}
