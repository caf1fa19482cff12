//! Item catalog service layer

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::items::model::{CreateItemRequest, Item, ItemFilter, UpdateItemRequest};
use crate::models::PaginatedResponse;

#[derive(Clone)]
pub struct ItemService {
    db_pool: PgPool,
}

impl ItemService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn create_item(
        &self,
        owner_id: Uuid,
        request: CreateItemRequest,
    ) -> Result<Item, ApiError> {
        request.validate().map_err(ApiError::ValidationError)?;
        let now = Utc::now();

        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (
                id, owner_id, title, description, category, condition,
                price_per_day_cents, deposit_cents, location, images,
                available, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(request.title.trim())
        .bind(&request.description)
        .bind(request.category)
        .bind(request.condition)
        .bind(request.price_per_day_cents)
        .bind(request.deposit_cents.unwrap_or(0))
        .bind(&request.location)
        .bind(request.images.unwrap_or_default())
        .bind(true)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(item)
    }

    pub async fn get_item(&self, id: Uuid) -> Result<Item, ApiError> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(ApiError::NotFound("Item not found".to_string()))
    }

    pub async fn list_items(&self, filter: ItemFilter) -> Result<PaginatedResponse<Item>, ApiError> {
        let page = filter.page.unwrap_or(1).max(1);
        let limit = filter.limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * limit;

        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT * FROM items WHERE 1=1");
        let mut count_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT COUNT(*) FROM items WHERE 1=1");

        if let Some(category) = filter.category {
            query_builder.push(" AND category = ");
            query_builder.push_bind(category);
            count_builder.push(" AND category = ");
            count_builder.push_bind(category);
        }
        if let Some(owner_id) = filter.owner_id {
            query_builder.push(" AND owner_id = ");
            query_builder.push_bind(owner_id);
            count_builder.push(" AND owner_id = ");
            count_builder.push_bind(owner_id);
        }
        if let Some(available) = filter.available {
            query_builder.push(" AND available = ");
            query_builder.push_bind(available);
            count_builder.push(" AND available = ");
            count_builder.push_bind(available);
        }
        if let Some(q) = &filter.q {
            let pattern = format!("%{}%", q);
            query_builder.push(" AND (title ILIKE ");
            query_builder.push_bind(pattern.clone());
            query_builder.push(" OR description ILIKE ");
            query_builder.push_bind(pattern.clone());
            query_builder.push(")");
            count_builder.push(" AND (title ILIKE ");
            count_builder.push_bind(pattern.clone());
            count_builder.push(" OR description ILIKE ");
            count_builder.push_bind(pattern);
            count_builder.push(")");
        }

        query_builder.push(" ORDER BY created_at DESC LIMIT ");
        query_builder.push_bind(limit as i64);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset as i64);

        let items = query_builder
            .build_query_as::<Item>()
            .fetch_all(&self.db_pool)
            .await?;

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;

        Ok(PaginatedResponse {
            data: items,
            total,
            page,
            limit,
        })
    }

    pub async fn update_item(
        &self,
        owner_id: Uuid,
        id: Uuid,
        request: UpdateItemRequest,
    ) -> Result<Item, ApiError> {
        request.validate().map_err(ApiError::ValidationError)?;

        let item = self.get_item(id).await?;
        if item.owner_id != owner_id {
            return Err(ApiError::Forbidden(
                "Only the owner can update an item".to_string(),
            ));
        }

        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                condition = COALESCE($5, condition),
                price_per_day_cents = COALESCE($6, price_per_day_cents),
                deposit_cents = COALESCE($7, deposit_cents),
                location = COALESCE($8, location),
                images = COALESCE($9, images),
                updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.title.as_deref().map(str::trim))
        .bind(&request.description)
        .bind(request.category)
        .bind(request.condition)
        .bind(request.price_per_day_cents)
        .bind(request.deposit_cents)
        .bind(&request.location)
        .bind(&request.images)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(item)
    }

    /// Toggle whether an item can receive new borrow requests.
    /// Items are never hard-deleted.
    pub async fn set_availability(
        &self,
        owner_id: Uuid,
        id: Uuid,
        available: bool,
    ) -> Result<Item, ApiError> {
        let item = self.get_item(id).await?;
        if item.owner_id != owner_id {
            return Err(ApiError::Forbidden(
                "Only the owner can change availability".to_string(),
            ));
        }

        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET available = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(available)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(item)
    }
}
