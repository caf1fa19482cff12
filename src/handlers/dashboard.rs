//! Dashboard HTTP handlers

use axum::{
    extract::{Query, State},
    Json,
};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i32>,
}

/// One entry in the merged activity feed
#[derive(Debug, serde::Serialize)]
pub struct ActivityItem {
    pub kind: String,
    pub id: Uuid,
    pub status: String,
    pub amount_cents: i64,
    pub occurred_at: DateTime<Utc>,
}

/// GET /api/dashboard/activity - Recent requests, bookings and wallet
/// movement for the caller, merged newest first
pub async fn activity(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityItem>>, ApiError> {
    let limit = i64::from(query.limit.unwrap_or(20).clamp(1, 50));

    let requests: Vec<(Uuid, String, i64, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT id, status::TEXT, total_cents, updated_at
        FROM borrow_requests
        WHERE borrower_id = $1 OR lender_id = $1
        ORDER BY updated_at DESC
        LIMIT $2
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .fetch_all(&state.db_pool)
    .await?;

    let bookings: Vec<(Uuid, String, i64, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT id, status::TEXT, total_cents, updated_at
        FROM service_bookings
        WHERE customer_id = $1 OR provider_id = $1
        ORDER BY updated_at DESC
        LIMIT $2
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .fetch_all(&state.db_pool)
    .await?;

    let transactions: Vec<(Uuid, String, i64, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT id, status::TEXT, amount_cents, created_at
        FROM wallet_transactions
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .fetch_all(&state.db_pool)
    .await?;

    let mut feed: Vec<ActivityItem> = Vec::with_capacity(
        requests.len() + bookings.len() + transactions.len(),
    );
    for (kind, rows) in [
        ("borrow_request", requests),
        ("booking", bookings),
        ("wallet_transaction", transactions),
    ] {
        feed.extend(rows.into_iter().map(|(id, status, amount_cents, occurred_at)| {
            ActivityItem {
                kind: kind.to_string(),
                id,
                status,
                amount_cents,
                occurred_at,
            }
        }));
    }

    feed.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    feed.truncate(limit as usize);

    Ok(Json(feed))
}
