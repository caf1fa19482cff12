//! Wallet HTTP handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{PaginatedResponse, PaginationParams};
use crate::state::AppState;
use crate::wallet::{
    DepositRequest, UserWallet, WalletTransaction, WithdrawRequest, WithdrawalReceipt,
};

/// GET /api/wallet - The caller's balance and running totals
pub async fn get_wallet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserWallet>, ApiError> {
    let wallet = state.wallet_service.get_wallet(user.user_id).await?;
    Ok(Json(wallet))
}

/// GET /api/wallet/transactions - Ledger history, newest first
pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<WalletTransaction>>, ApiError> {
    let transactions = state
        .wallet_service
        .list_transactions(user.user_id, pagination)
        .await?;
    Ok(Json(transactions))
}

/// POST /api/wallet/withdraw - Move available funds out, minus the speed fee
pub async fn withdraw(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<WithdrawRequest>,
) -> Result<(StatusCode, Json<WithdrawalReceipt>), ApiError> {
    let receipt = state.wallet_service.withdraw(user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// POST /api/wallet/deposit - Top up the available balance
pub async fn deposit(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<DepositRequest>,
) -> Result<(StatusCode, Json<WalletTransaction>), ApiError> {
    let transaction = state.wallet_service.deposit(user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}
