//! Payment webhook handler

use axum::{extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    /// The id we handed to the provider when opening the session:
    /// a borrow request id or a booking id
    pub reference: Uuid,
    pub session_id: Option<String>,
}

/// POST /api/payments/webhook - Provider callback for settled sessions.
/// Fails closed: without a configured shared secret no webhook is
/// accepted at all.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, ApiError> {
    let expected = state.webhook_secret.as_deref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Payment webhooks are not configured".to_string())
    })?;

    let presented = headers
        .get("x-webhook-secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if presented != expected {
        tracing::warn!("Payment webhook rejected: bad or missing secret");
        return Err(ApiError::Unauthorized("Invalid webhook secret".to_string()));
    }

    if payload.event != "checkout.completed" {
        tracing::debug!(event = %payload.event, "Ignoring payment webhook event");
        return Ok(Json(json!({ "status": "ignored" })));
    }

    let is_borrow: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM borrow_requests WHERE id = $1)")
            .bind(payload.reference)
            .fetch_one(&state.db_pool)
            .await?;

    if is_borrow {
        state
            .borrow_service
            .confirm_payment(payload.reference)
            .await?;
        return Ok(Json(json!({ "status": "ok" })));
    }

    let is_booking: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM service_bookings WHERE id = $1)")
            .bind(payload.reference)
            .fetch_one(&state.db_pool)
            .await?;

    if is_booking {
        state
            .booking_service
            .confirm_payment(payload.reference)
            .await?;
        return Ok(Json(json!({ "status": "ok" })));
    }

    tracing::warn!(reference = %payload.reference, "Payment webhook for unknown reference");
    Err(ApiError::NotFound("Unknown payment reference".to_string()))
}
