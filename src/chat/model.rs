//! Direct message models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// A direct message between two users, optionally tied to a borrow request
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub request_id: Option<Uuid>,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for sending a message
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    pub request_id: Option<Uuid>,
    pub body: String,
}

impl SendMessageRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.body.trim().is_empty() {
            return Err("Message body must not be empty".to_string());
        }
        if self.body.len() > 4_000 {
            return Err("Message body must not exceed 4000 characters".to_string());
        }
        Ok(())
    }
}

/// One row in the caller's inbox overview: the latest message
/// exchanged with a peer plus how many from them are still unread
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ConversationSummary {
    pub peer_id: Uuid,
    pub last_body: String,
    pub last_at: DateTime<Utc>,
    pub unread: i64,
}

/// Response DTO for the unread badge
#[derive(Debug, Serialize)]
pub struct UnreadMessages {
    pub unread: i64,
}
