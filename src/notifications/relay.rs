//! Outbox relay
//!
//! Polls undelivered notification rows and pushes them to connected
//! WebSocket clients, then stamps them delivered. Push is best-effort;
//! the notifications table stays the durable record either way.

use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::notifications::model::Notification;
use crate::realtime::{RealtimeEvent, WsState};

const RELAY_BATCH_SIZE: i64 = 100;

/// Background job delivering the notification backlog
pub async fn notification_relay(db_pool: PgPool, ws_state: WsState, poll_seconds: u64) {
    tracing::info!("Starting notification relay");

    loop {
        tokio::time::sleep(Duration::from_secs(poll_seconds)).await;

        match deliver_backlog(&db_pool, &ws_state).await {
            Ok(0) => {}
            Ok(delivered) => {
                tracing::debug!("Delivered {} notifications", delivered);
            }
            Err(e) => {
                tracing::error!("Error delivering notifications: {}", e);
            }
        }
    }
}

/// Deliver one batch of undelivered notifications.
///
/// With no client connected the backlog is left in place and retried on
/// the next tick, so subscribers joining later still get a push.
async fn deliver_backlog(db_pool: &PgPool, ws_state: &WsState) -> Result<usize> {
    if ws_state.client_count().await == 0 {
        return Ok(0);
    }

    let backlog = sqlx::query_as::<_, Notification>(
        r#"
        SELECT * FROM notifications
        WHERE delivered_at IS NULL
        ORDER BY created_at ASC
        LIMIT $1
        "#,
    )
    .bind(RELAY_BATCH_SIZE)
    .fetch_all(db_pool)
    .await?;

    if backlog.is_empty() {
        return Ok(0);
    }

    let ids: Vec<Uuid> = backlog.iter().map(|n| n.id).collect();

    for notification in backlog {
        ws_state.broadcast_event(RealtimeEvent::Notification {
            user_id: notification.user_id,
            notification,
        });
    }

    let delivered = sqlx::query("UPDATE notifications SET delivered_at = $1 WHERE id = ANY($2)")
        .bind(Utc::now())
        .bind(&ids)
        .execute(db_pool)
        .await?
        .rows_affected();

    Ok(delivered as usize)
}
