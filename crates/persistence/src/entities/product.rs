//! Product entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the products table.
#[derive(Debug, Clone, FromRow)]
pub struct ProductEntity {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product row joined with its brand name.
#[derive(Debug, Clone, FromRow)]
pub struct ProductWithBrandEntity {
    #[sqlx(flatten)]
    pub product: ProductEntity,
    pub brand_name: String,
}

impl From<ProductEntity> for domain::models::Product {
    fn from(entity: ProductEntity) -> Self {
        Self {
            id: entity.id,
            brand_id: entity.brand_id,
            name: entity.name,
            slug: entity.slug,
            description: entity.description,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
