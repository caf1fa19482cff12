//! Borrow review HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{PaginatedResponse, PaginationParams};
use crate::reviews::{CreateReviewRequest, Review, UserRatingSummary};
use crate::state::AppState;

/// Reviews received by a user plus their aggregate standing
#[derive(Debug, serde::Serialize)]
pub struct UserReviewsResponse {
    pub summary: UserRatingSummary,
    pub reviews: PaginatedResponse<Review>,
}

/// POST /api/reviews - Review the other party of a completed borrow
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let review = state.review_service.create_review(user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /api/reviews/user/:id - Reviews received by a user, with average
pub async fn reviews_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<UserReviewsResponse>, ApiError> {
    let summary = state.review_service.rating_summary(user_id).await?;
    let reviews = state
        .review_service
        .list_for_user(user_id, pagination)
        .await?;
    Ok(Json(UserReviewsResponse { summary, reviews }))
}
