//! Service booking HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::bookings::{
    Booking, BookingFilter, BookingWithPayment, CancelBookingRequest, CreateBookingRequest,
    RespondBookingRequest, ReviewBookingRequest,
};
use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::PaginatedResponse;
use crate::state::AppState;

/// POST /api/bookings - Book a slot and open checkout
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingWithPayment>), ApiError> {
    let booking = state
        .booking_service
        .create_booking(user.user_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/bookings - The caller's bookings, both sides
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<PaginatedResponse<Booking>>, ApiError> {
    let bookings = state
        .booking_service
        .list_bookings(user.user_id, filter)
        .await?;
    Ok(Json(bookings))
}

/// GET /api/bookings/:id - A single booking (parties only)
pub async fn get_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state.booking_service.get_booking(user.user_id, id).await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/respond - Accept or decline (provider)
pub async fn respond(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RespondBookingRequest>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state
        .booking_service
        .respond(user.user_id, id, req)
        .await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/start - Mark work underway (provider)
pub async fn start(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state.booking_service.start(user.user_id, id).await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/complete - Mark work done (provider)
pub async fn complete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state.booking_service.complete(user.user_id, id).await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/cancel - Back out (either party)
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelBookingRequest>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state
        .booking_service
        .cancel(user.user_id, id, req)
        .await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/review - Rate the other side of a completed booking
pub async fn review(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewBookingRequest>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state
        .booking_service
        .review(user.user_id, id, req)
        .await?;
    Ok(Json(booking))
}
