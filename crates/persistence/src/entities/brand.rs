//! Brand entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the brands table.
#[derive(Debug, Clone, FromRow)]
pub struct BrandEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Brand row joined with the number of products it owns.
#[derive(Debug, Clone, FromRow)]
pub struct BrandWithCountEntity {
    #[sqlx(flatten)]
    pub brand: BrandEntity,
    pub product_count: i64,
}

impl From<BrandEntity> for domain::models::Brand {
    fn from(entity: BrandEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            slug: entity.slug,
            description: entity.description,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
