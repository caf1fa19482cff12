//! Notification feed HTTP handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{PaginatedResponse, PaginationParams};
use crate::notifications::{Notification, UnreadCount};
use crate::state::AppState;

/// GET /api/notifications - The caller's feed, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<Notification>>, ApiError> {
    let notifications = state
        .notification_service
        .list(user.user_id, pagination)
        .await?;
    Ok(Json(notifications))
}

/// GET /api/notifications/unread-count - Badge count
pub async fn unread_count(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UnreadCount>, ApiError> {
    let unread = state.notification_service.unread_count(user.user_id).await?;
    Ok(Json(UnreadCount { unread }))
}

/// POST /api/notifications/:id/read - Mark one as read
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = state
        .notification_service
        .mark_read(user.user_id, id)
        .await?;
    Ok(Json(notification))
}

#[derive(Debug, serde::Serialize)]
pub struct MarkAllReadResponse {
    pub marked: u64,
}

/// POST /api/notifications/read-all - Clear the badge
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let marked = state
        .notification_service
        .mark_all_read(user.user_id)
        .await?;
    Ok(Json(MarkAllReadResponse { marked }))
}
