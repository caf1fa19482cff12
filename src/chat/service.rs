//! Direct messaging between users

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::chat::model::{ChatMessage, ConversationSummary, SendMessageRequest};
use crate::error::ApiError;
use crate::models::{PaginatedResponse, PaginationParams};
use crate::realtime::{RealtimeEvent, WsState};

#[derive(Clone)]
pub struct ChatService {
    db_pool: PgPool,
    ws: WsState,
}

impl ChatService {
    pub fn new(db_pool: PgPool, ws: WsState) -> Self {
        Self { db_pool, ws }
    }

    /// Persist a message and push it to the recipient's live sockets.
    /// The push is best-effort; offline recipients see the message when
    /// they next load the conversation.
    pub async fn send(
        &self,
        sender_id: Uuid,
        request: SendMessageRequest,
    ) -> Result<ChatMessage, ApiError> {
        request.validate().map_err(ApiError::ValidationError)?;

        if request.recipient_id == sender_id {
            return Err(ApiError::ValidationError(
                "You cannot message yourself".to_string(),
            ));
        }

        let recipient_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(request.recipient_id)
                .fetch_one(&self.db_pool)
                .await?;
        if !recipient_exists {
            return Err(ApiError::NotFound("Recipient not found".to_string()));
        }

        if let Some(request_id) = request.request_id {
            let is_party: bool = sqlx::query_scalar(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM borrow_requests
                    WHERE id = $1 AND (borrower_id = $2 OR lender_id = $2)
                )
                "#,
            )
            .bind(request_id)
            .bind(sender_id)
            .fetch_one(&self.db_pool)
            .await?;
            if !is_party {
                return Err(ApiError::Forbidden(
                    "You are not part of that borrow request".to_string(),
                ));
            }
        }

        let message = sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO messages (id, sender_id, recipient_id, request_id, body, read, created_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(request.recipient_id)
        .bind(request.request_id)
        .bind(request.body.trim())
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        self.ws.broadcast_event(RealtimeEvent::MessageReceived {
            user_id: message.recipient_id,
            message: message.clone(),
        });

        Ok(message)
    }

    /// The two-way thread with one peer, newest first. Messages from
    /// the peer are marked read as a side effect of viewing the page.
    pub async fn conversation_with(
        &self,
        user_id: Uuid,
        peer_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<PaginatedResponse<ChatMessage>, ApiError> {
        let (limit, offset) = pagination.limit_offset();

        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT * FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(peer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            "#,
        )
        .bind(user_id)
        .bind(peer_id)
        .fetch_one(&self.db_pool)
        .await?;

        sqlx::query(
            "UPDATE messages SET read = TRUE WHERE sender_id = $1 AND recipient_id = $2 AND NOT read",
        )
        .bind(peer_id)
        .bind(user_id)
        .execute(&self.db_pool)
        .await?;

        Ok(PaginatedResponse {
            data: messages,
            total,
            page: pagination.page.unwrap_or(1).max(1),
            limit: pagination.limit.unwrap_or(20).clamp(1, 100),
        })
    }

    /// Inbox overview: one row per peer, latest exchange first
    pub async fn conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>, ApiError> {
        let summaries = sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT peer_id, last_body, last_at, unread FROM (
                SELECT
                    CASE WHEN sender_id = $1 THEN recipient_id ELSE sender_id END AS peer_id,
                    body AS last_body,
                    created_at AS last_at,
                    ROW_NUMBER() OVER (
                        PARTITION BY CASE WHEN sender_id = $1 THEN recipient_id ELSE sender_id END
                        ORDER BY created_at DESC
                    ) AS rn,
                    COUNT(*) FILTER (WHERE recipient_id = $1 AND NOT read) OVER (
                        PARTITION BY CASE WHEN sender_id = $1 THEN recipient_id ELSE sender_id END
                    ) AS unread
                FROM messages
                WHERE sender_id = $1 OR recipient_id = $1
            ) threads
            WHERE rn = 1
            ORDER BY last_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(summaries)
    }

    /// Unread badge count
    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, ApiError> {
        let unread: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND NOT read")
                .bind(user_id)
                .fetch_one(&self.db_pool)
                .await?;
        Ok(unread)
    }
}
