//! Service catalog HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::bookings::{CalendarQuery, CalendarSlot};
use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::PaginatedResponse;
use crate::services::{CreateServiceRequest, ServiceFilter, ServiceListing, UpdateServiceRequest};
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// POST /api/services - Offer a service
pub async fn create_service(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceListing>), ApiError> {
    let service = state
        .service_catalog
        .create_service(user.user_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(service)))
}

/// GET /api/services - Browse services
pub async fn list_services(
    State(state): State<AppState>,
    Query(filter): Query<ServiceFilter>,
) -> Result<Json<PaginatedResponse<ServiceListing>>, ApiError> {
    let services = state.service_catalog.list_services(filter).await?;
    Ok(Json(services))
}

/// GET /api/services/:id - A single service
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceListing>, ApiError> {
    let service = state.service_catalog.get_service(id).await?;
    Ok(Json(service))
}

/// PUT /api/services/:id - Update a service (provider only)
pub async fn update_service(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateServiceRequest>,
) -> Result<Json<ServiceListing>, ApiError> {
    let service = state
        .service_catalog
        .update_service(user.user_id, id, req)
        .await?;
    Ok(Json(service))
}

/// POST /api/services/:id/active - Pause or resume bookings (provider only)
pub async fn set_active(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<ServiceListing>, ApiError> {
    let service = state
        .service_catalog
        .set_active(user.user_id, id, req.is_active)
        .await?;
    Ok(Json(service))
}

/// GET /api/services/:id/calendar?date=YYYY-MM-DD - Occupied slots for a day
pub async fn day_calendar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<CalendarSlot>>, ApiError> {
    let slots = state.booking_service.day_calendar(id, query.date).await?;
    Ok(Json(slots))
}
