//! Notification models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// A notification row. `delivered_at IS NULL` marks the outbox backlog
/// the relay has not yet pushed over the WebSocket hub.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub read: bool,
    pub request_id: Option<Uuid>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Response DTO for the unread badge
#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}
