//! Reviews for completed borrows

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::borrows::{BorrowRequest, RequestStatus};
use crate::error::ApiError;
use crate::models::{PaginatedResponse, PaginationParams};
use crate::notifications::NotificationService;
use crate::reviews::model::{CreateReviewRequest, Review, UserRatingSummary};

#[derive(Clone)]
pub struct ReviewService {
    db_pool: PgPool,
    notifications: NotificationService,
}

impl ReviewService {
    pub fn new(db_pool: PgPool, notifications: NotificationService) -> Self {
        Self {
            db_pool,
            notifications,
        }
    }

    /// Leave a review on a completed borrow. One review per party per
    /// request; the unique constraint backs this up under races.
    pub async fn create_review(
        &self,
        reviewer_id: Uuid,
        request: CreateReviewRequest,
    ) -> Result<Review, ApiError> {
        request
            .validate()
            .map_err(ApiError::ValidationError)?;

        let borrow =
            sqlx::query_as::<_, BorrowRequest>("SELECT * FROM borrow_requests WHERE id = $1")
                .bind(request.request_id)
                .fetch_optional(&self.db_pool)
                .await?
                .ok_or_else(|| ApiError::NotFound("Borrow request not found".to_string()))?;

        if !borrow.is_party(reviewer_id) {
            return Err(ApiError::Forbidden(
                "You are not part of this borrow request".to_string(),
            ));
        }
        if borrow.status != RequestStatus::Completed {
            return Err(ApiError::InvalidTransition(
                "Only completed borrows can be reviewed".to_string(),
            ));
        }

        let reviewee_id = borrow.counterparty(reviewer_id);
        let mut tx = self.db_pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (id, request_id, reviewer_id, reviewee_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.request_id)
        .bind(reviewer_id)
        .bind(reviewee_id)
        .bind(request.rating)
        .bind(&request.comment)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                ApiError::Conflict("You have already reviewed this borrow".to_string())
            }
            _ => ApiError::DatabaseError(e.to_string()),
        })?;

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                reviewee_id,
                "New review",
                &format!("You received a {}-star review", request.rating),
                "review_received",
                Some(request.request_id),
            )
            .await?;

        tx.commit().await?;
        Ok(review)
    }

    /// Reviews received by a user, newest first
    pub async fn list_for_user(
        &self,
        reviewee_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<PaginatedResponse<Review>, ApiError> {
        let (limit, offset) = pagination.limit_offset();

        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT * FROM reviews
            WHERE reviewee_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(reviewee_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE reviewee_id = $1")
            .bind(reviewee_id)
            .fetch_one(&self.db_pool)
            .await?;

        Ok(PaginatedResponse {
            data: reviews,
            total,
            page: pagination.page.unwrap_or(1).max(1),
            limit: pagination.limit.unwrap_or(20).clamp(1, 100),
        })
    }

    /// Review count and average rating for a user
    pub async fn rating_summary(&self, user_id: Uuid) -> Result<UserRatingSummary, ApiError> {
        let (review_count, average_rating_hundredths): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(CAST(ROUND(AVG(rating) * 100) AS BIGINT), 0)
            FROM reviews
            WHERE reviewee_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(UserRatingSummary {
            user_id,
            review_count,
            average_rating_hundredths,
        })
    }
}
