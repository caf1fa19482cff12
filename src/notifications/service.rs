//! Notification emitter service layer
//!
//! State transitions enqueue their notification in the same transaction
//! as the transition itself; the relay delivers the backlog afterwards.
//! Notifications describe outcomes and must never decide them: no
//! enqueue or delivery failure may abort a booking, payment or refund.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{PaginatedResponse, PaginationParams};
use crate::notifications::model::Notification;

#[derive(Clone)]
pub struct NotificationService {
    db_pool: PgPool,
}

impl NotificationService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Insert an undelivered notification inside an existing transaction.
    ///
    /// Commits (or rolls back) together with the state transition it
    /// describes, so no transition exists without its notice.
    pub async fn enqueue_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        title: &str,
        message: &str,
        kind: &str,
        request_id: Option<Uuid>,
    ) -> Result<Notification, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (
                id, user_id, title, message, kind, read, request_id,
                delivered_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, NULL, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .bind(message)
        .bind(kind)
        .bind(request_id)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await
    }

    /// Pool-level fire-and-forget variant for call sites with no
    /// surrounding transaction. Failures are logged, never escalated.
    pub async fn emit(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        kind: &str,
        request_id: Option<Uuid>,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (
                id, user_id, title, message, kind, read, request_id,
                delivered_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, NULL, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .bind(message)
        .bind(kind)
        .bind(request_id)
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(
                user_id = %user_id,
                kind = %kind,
                "Failed to emit notification: {}",
                e
            );
        }
    }

    /// Notification feed, newest first
    pub async fn list(
        &self,
        user_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<PaginatedResponse<Notification>, ApiError> {
        let (limit, offset) = pagination.limit_offset();

        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.db_pool)
                .await?;

        Ok(PaginatedResponse {
            data: notifications,
            total,
            page: pagination.page.unwrap_or(1).max(1),
            limit: pagination.limit.unwrap_or(20).clamp(1, 100),
        })
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(count)
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification, ApiError> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Notification not found".to_string()))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ApiError> {
        let rows_affected =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE")
                .bind(user_id)
                .execute(&self.db_pool)
                .await?
                .rows_affected();

        Ok(rows_affected)
    }
}
