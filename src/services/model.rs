//! Service listing models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// A bookable service offered by a provider
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ServiceListing {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price_cents: i64,
    pub price_type: PriceType,
    pub location: String,
    pub availability: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    /// Average rating in hundredths of a star (e.g. 450 = 4.50)
    pub rating_hundredths: i64,
    pub total_reviews: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How a service's price applies to a booking
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "price_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    PerHour,
    PerDay,
    PerService,
    PerVisit,
}

/// Request DTO for offering a service
#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price_cents: i64,
    pub price_type: PriceType,
    pub location: String,
    pub availability: Option<String>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

impl CreateServiceRequest {
    /// Validate request
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title must not be empty".to_string());
        }
        if self.price_cents < 0 {
            return Err("Price must not be negative".to_string());
        }
        Ok(())
    }
}

/// Request DTO for updating a service; absent fields are left unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub price_type: Option<PriceType>,
    pub location: Option<String>,
    pub availability: Option<String>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

impl UpdateServiceRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err("Title must not be empty".to_string());
        }
        if self.price_cents.is_some_and(|p| p < 0) {
            return Err("Price must not be negative".to_string());
        }
        Ok(())
    }
}

/// Query parameters for listing services
#[derive(Debug, Deserialize)]
pub struct ServiceFilter {
    pub category: Option<String>,
    pub provider_id: Option<Uuid>,
    pub is_active: Option<bool>,
    /// Case-insensitive match against title and description
    pub q: Option<String>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}
