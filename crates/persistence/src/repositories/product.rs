//! Product repository for database operations.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{ProductEntity, ProductWithBrandEntity};
use crate::metrics::QueryTimer;

const PRODUCT_WITH_BRAND_SELECT: &str = r#"
    SELECT p.id, p.brand_id, p.name, p.slug, p.description, p.is_active,
           p.created_at, p.updated_at, b.name AS brand_name
    FROM products p
    JOIN brands b ON b.id = p.brand_id
"#;

/// Repository for product-related database operations.
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Creates a new ProductRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new product under a brand.
    pub async fn create(
        &self,
        brand_id: Uuid,
        name: &str,
        slug: &str,
        description: &str,
        is_active: bool,
    ) -> Result<ProductEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_product");
        let result = sqlx::query_as::<_, ProductEntity>(
            r#"
            INSERT INTO products (brand_id, name, slug, description, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(brand_id)
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a product by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProductEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_product_by_id");
        let result = sqlx::query_as::<_, ProductEntity>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find a product by ID together with its brand name.
    pub async fn find_with_brand(
        &self,
        id: Uuid,
    ) -> Result<Option<ProductWithBrandEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_product_with_brand");
        let sql = format!("{} WHERE p.id = $1", PRODUCT_WITH_BRAND_SELECT);
        let result = sqlx::query_as::<_, ProductWithBrandEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// List products, newest first.
    pub async fn list(
        &self,
        brand_id: Option<Uuid>,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductWithBrandEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_products");
        let sql = format!(
            "{} WHERE ($1::UUID IS NULL OR p.brand_id = $1) \
               AND ($2::BOOLEAN IS NULL OR p.is_active = $2) \
             ORDER BY p.created_at DESC, p.id LIMIT $3 OFFSET $4",
            PRODUCT_WITH_BRAND_SELECT
        );
        let result = sqlx::query_as::<_, ProductWithBrandEntity>(&sql)
            .bind(brand_id)
            .bind(is_active)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Count products matching the list filter.
    pub async fn count(
        &self,
        brand_id: Option<Uuid>,
        is_active: Option<bool>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_products");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM products
            WHERE ($1::UUID IS NULL OR brand_id = $1)
              AND ($2::BOOLEAN IS NULL OR is_active = $2)
            "#,
        )
        .bind(brand_id)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partially update a product.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        slug: Option<&str>,
        description: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<ProductEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_product");
        let result = sqlx::query_as::<_, ProductEntity>(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a product inside a transaction.
    pub async fn find_in_tx(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<ProductEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_product_in_tx");
        let result = sqlx::query_as::<_, ProductEntity>(
            "SELECT * FROM products WHERE id = $1 FOR SHARE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Distinct products licensed under a key.
    pub async fn list_for_license_key(
        &self,
        license_key_id: Uuid,
    ) -> Result<Vec<ProductEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_products_for_license_key");
        let result = sqlx::query_as::<_, ProductEntity>(
            r#"
            SELECT DISTINCT p.*
            FROM products p
            JOIN licenses l ON l.product_id = p.id
            WHERE l.license_key_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(license_key_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
