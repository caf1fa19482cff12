//! Item catalog HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::items::{CreateItemRequest, Item, ItemFilter, UpdateItemRequest};
use crate::middleware::AuthenticatedUser;
use crate::models::PaginatedResponse;
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct SetAvailabilityRequest {
    pub available: bool,
}

/// POST /api/items - List an item for lending
pub async fn create_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let item = state.item_service.create_item(user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/items - Browse the catalog
pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> Result<Json<PaginatedResponse<Item>>, ApiError> {
    let items = state.item_service.list_items(filter).await?;
    Ok(Json(items))
}

/// GET /api/items/:id - A single item
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Item>, ApiError> {
    let item = state.item_service.get_item(id).await?;
    Ok(Json(item))
}

/// PUT /api/items/:id - Update an item (owner only)
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<Item>, ApiError> {
    let item = state
        .item_service
        .update_item(user.user_id, id, req)
        .await?;
    Ok(Json(item))
}

/// POST /api/items/:id/availability - Show or hide an item (owner only)
pub async fn set_availability(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetAvailabilityRequest>,
) -> Result<Json<Item>, ApiError> {
    let item = state
        .item_service
        .set_availability(user.user_id, id, req.available)
        .await?;
    Ok(Json(item))
}
