//! Borrow request HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::borrows::{
    BorrowRequest, BorrowRequestFilter, CreateBorrowRequest, Negotiation, ProposePriceRequest,
};
use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::PaginatedResponse;
use crate::payments::PaymentSession;
use crate::state::AppState;

/// POST /api/borrow-requests - Ask to borrow an item
pub async fn create_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateBorrowRequest>,
) -> Result<(StatusCode, Json<BorrowRequest>), ApiError> {
    let request = state
        .borrow_service
        .create_request(user.user_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/borrow-requests - The caller's requests, both sides
pub async fn list_requests(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<BorrowRequestFilter>,
) -> Result<Json<PaginatedResponse<BorrowRequest>>, ApiError> {
    let requests = state
        .borrow_service
        .list_requests(user.user_id, filter)
        .await?;
    Ok(Json(requests))
}

/// GET /api/borrow-requests/:id - A single request (parties only)
pub async fn get_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BorrowRequest>, ApiError> {
    let request = state.borrow_service.get_request(user.user_id, id).await?;
    Ok(Json(request))
}

/// POST /api/borrow-requests/:id/negotiations - Propose a daily price
pub async fn propose_price(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ProposePriceRequest>,
) -> Result<(StatusCode, Json<Negotiation>), ApiError> {
    let negotiation = state
        .borrow_service
        .propose_price(user.user_id, id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(negotiation)))
}

/// GET /api/borrow-requests/:id/negotiations - Proposal history
pub async fn list_negotiations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Negotiation>>, ApiError> {
    let negotiations = state
        .borrow_service
        .list_negotiations(user.user_id, id)
        .await?;
    Ok(Json(negotiations))
}

/// POST /api/borrow-requests/:id/approve - Accept at the current price (lender)
pub async fn approve(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BorrowRequest>, ApiError> {
    let request = state.borrow_service.approve(user.user_id, id).await?;
    Ok(Json(request))
}

/// POST /api/borrow-requests/:id/reject - Decline (lender)
pub async fn reject(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BorrowRequest>, ApiError> {
    let request = state.borrow_service.reject(user.user_id, id).await?;
    Ok(Json(request))
}

/// POST /api/borrow-requests/:id/cancel - Withdraw (either party)
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BorrowRequest>, ApiError> {
    let request = state.borrow_service.cancel(user.user_id, id).await?;
    Ok(Json(request))
}

/// POST /api/borrow-requests/:id/payment-session - Open checkout (borrower)
pub async fn create_payment_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<PaymentSession>), ApiError> {
    let session = state
        .borrow_service
        .create_payment_session(user.user_id, id)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /api/borrow-requests/:id/activate - Mark handed over (lender)
pub async fn activate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BorrowRequest>, ApiError> {
    let request = state.borrow_service.activate(user.user_id, id).await?;
    Ok(Json(request))
}

/// POST /api/borrow-requests/:id/complete - Confirm the return (lender)
pub async fn complete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BorrowRequest>, ApiError> {
    let request = state.borrow_service.complete(user.user_id, id).await?;
    Ok(Json(request))
}
