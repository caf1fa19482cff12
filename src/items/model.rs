//! Item catalog models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// A physical item offered for borrowing
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Item {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ItemCategory,
    pub condition: ItemCondition,
    pub price_per_day_cents: i64,
    pub deposit_cents: i64,
    pub location: String,
    pub images: Vec<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "item_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Electronics,
    Tools,
    Sports,
    Books,
    Furniture,
    Clothing,
    Vehicles,
    Other,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "item_condition", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
    New,
    LikeNew,
    Good,
    Fair,
}

/// Request DTO for listing an item
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub title: String,
    pub description: String,
    pub category: ItemCategory,
    pub condition: ItemCondition,
    pub price_per_day_cents: i64,
    pub deposit_cents: Option<i64>,
    pub location: String,
    pub images: Option<Vec<String>>,
}

impl CreateItemRequest {
    /// Validate request
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title must not be empty".to_string());
        }
        if self.price_per_day_cents < 0 {
            return Err("Daily price must not be negative".to_string());
        }
        if self.deposit_cents.is_some_and(|d| d < 0) {
            return Err("Deposit must not be negative".to_string());
        }
        Ok(())
    }
}

/// Request DTO for updating an item; absent fields are left unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<ItemCategory>,
    pub condition: Option<ItemCondition>,
    pub price_per_day_cents: Option<i64>,
    pub deposit_cents: Option<i64>,
    pub location: Option<String>,
    pub images: Option<Vec<String>>,
}

impl UpdateItemRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err("Title must not be empty".to_string());
        }
        if self.price_per_day_cents.is_some_and(|p| p < 0) {
            return Err("Daily price must not be negative".to_string());
        }
        if self.deposit_cents.is_some_and(|d| d < 0) {
            return Err("Deposit must not be negative".to_string());
        }
        Ok(())
    }
}

/// Query parameters for listing items
#[derive(Debug, Deserialize)]
pub struct ItemFilter {
    pub category: Option<ItemCategory>,
    pub owner_id: Option<Uuid>,
    pub available: Option<bool>,
    /// Case-insensitive match against title and description
    pub q: Option<String>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}
