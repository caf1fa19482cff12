//! Service catalog service layer

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::PaginatedResponse;
use crate::services::model::{
    CreateServiceRequest, ServiceFilter, ServiceListing, UpdateServiceRequest,
};

#[derive(Clone)]
pub struct ServiceCatalog {
    db_pool: PgPool,
}

impl ServiceCatalog {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn create_service(
        &self,
        provider_id: Uuid,
        request: CreateServiceRequest,
    ) -> Result<ServiceListing, ApiError> {
        request.validate().map_err(ApiError::ValidationError)?;
        let now = Utc::now();

        let service = sqlx::query_as::<_, ServiceListing>(
            r#"
            INSERT INTO services (
                id, provider_id, title, description, category, price_cents,
                price_type, location, availability, tags, images,
                rating_hundredths, total_reviews, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 0, 0, TRUE, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(provider_id)
        .bind(request.title.trim())
        .bind(&request.description)
        .bind(&request.category)
        .bind(request.price_cents)
        .bind(request.price_type)
        .bind(&request.location)
        .bind(request.availability.unwrap_or_default())
        .bind(request.tags.unwrap_or_default())
        .bind(request.images.unwrap_or_default())
        .bind(now)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(service)
    }

    pub async fn get_service(&self, id: Uuid) -> Result<ServiceListing, ApiError> {
        sqlx::query_as::<_, ServiceListing>("SELECT * FROM services WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(ApiError::NotFound("Service not found".to_string()))
    }

    pub async fn list_services(
        &self,
        filter: ServiceFilter,
    ) -> Result<PaginatedResponse<ServiceListing>, ApiError> {
        let page = filter.page.unwrap_or(1).max(1);
        let limit = filter.limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * limit;

        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT * FROM services WHERE 1=1");
        let mut count_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT COUNT(*) FROM services WHERE 1=1");

        if let Some(category) = &filter.category {
            query_builder.push(" AND category = ");
            query_builder.push_bind(category.clone());
            count_builder.push(" AND category = ");
            count_builder.push_bind(category.clone());
        }
        if let Some(provider_id) = filter.provider_id {
            query_builder.push(" AND provider_id = ");
            query_builder.push_bind(provider_id);
            count_builder.push(" AND provider_id = ");
            count_builder.push_bind(provider_id);
        }
        if let Some(is_active) = filter.is_active {
            query_builder.push(" AND is_active = ");
            query_builder.push_bind(is_active);
            count_builder.push(" AND is_active = ");
            count_builder.push_bind(is_active);
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

        let services = query_builder
            .build_query_as::<ServiceListing>()
            .fetch_all(&self.db_pool)
            .await?;

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;

        Ok(PaginatedResponse {
            data: services,
            total,
            page,
            limit,
        })
    }

    pub async fn update_service(
        &self,
        provider_id: Uuid,
        id: Uuid,
        request: UpdateServiceRequest,
    ) -> Result<ServiceListing, ApiError> {
        request.validate().map_err(ApiError::ValidationError)?;

        let service = self.get_service(id).await?;
        if service.provider_id != provider_id {
            return Err(ApiError::Forbidden(
                "Only the provider can update a service".to_string(),
            ));
        }

        let service = sqlx::query_as::<_, ServiceListing>(
            r#"
            UPDATE services SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                price_cents = COALESCE($5, price_cents),
                price_type = COALESCE($6, price_type),
                location = COALESCE($7, location),
                availability = COALESCE($8, availability),
                tags = COALESCE($9, tags),
                images = COALESCE($10, images),
                updated_at = $11
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.title.as_deref().map(str::trim))
        .bind(&request.description)
        .bind(&request.category)
        .bind(request.price_cents)
        .bind(request.price_type)
        .bind(&request.location)
        .bind(&request.availability)
        .bind(&request.tags)
        .bind(&request.images)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(service)
    }

    /// Activate or deactivate a listing. Inactive services refuse new
    /// bookings but keep their history.
    pub async fn set_active(
        &self,
        provider_id: Uuid,
        id: Uuid,
        is_active: bool,
    ) -> Result<ServiceListing, ApiError> {
        let service = self.get_service(id).await?;
        if service.provider_id != provider_id {
            return Err(ApiError::Forbidden(
                "Only the provider can change a service's status".to_string(),
            ));
        }

        let service = sqlx::query_as::<_, ServiceListing>(
            r#"
            UPDATE services SET is_active = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(is_active)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(service)
    }
}
