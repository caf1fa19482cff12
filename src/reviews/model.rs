//! Borrow review models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// A review left by one party of a completed borrow about the other
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Review {
    pub id: Uuid,
    pub request_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for leaving a review
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub request_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

impl CreateReviewRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.rating) {
            return Err("Rating must be between 1 and 5".to_string());
        }
        Ok(())
    }
}

/// Aggregate standing of a user as a reviewee
#[derive(Debug, Serialize)]
pub struct UserRatingSummary {
    pub user_id: Uuid,
    pub review_count: i64,
    /// Average rating in hundredths of a star (e.g. 450 = 4.50)
    pub average_rating_hundredths: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        for rating in [1, 3, 5] {
            assert!(CreateReviewRequest {
                request_id: Uuid::new_v4(),
                rating,
                comment: None
            }
            .validate()
            .is_ok());
        }
        for rating in [0, -1, 6] {
            assert!(CreateReviewRequest {
                request_id: Uuid::new_v4(),
                rating,
                comment: None
            }
            .validate()
            .is_err());
        }
    }
}
