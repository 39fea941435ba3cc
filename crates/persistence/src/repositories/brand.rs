//! Brand repository for database operations.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{BrandEntity, BrandWithCountEntity};
use crate::metrics::{LockMode, LockTimer, QueryTimer};

const BRAND_WITH_COUNT_SELECT: &str = r#"
    SELECT b.id, b.name, b.slug, b.description, b.is_active, b.created_at, b.updated_at,
           (SELECT COUNT(*) FROM products p WHERE p.brand_id = b.id) AS product_count
    FROM brands b
"#;

/// Repository for brand-related database operations.
#[derive(Clone)]
pub struct BrandRepository {
    pool: PgPool,
}

impl BrandRepository {
    /// Creates a new BrandRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new brand.
    pub async fn create(
        &self,
        name: &str,
        slug: &str,
        description: &str,
        is_active: bool,
    ) -> Result<BrandEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_brand");
        let result = sqlx::query_as::<_, BrandEntity>(
            r#"
            INSERT INTO brands (name, slug, description, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a brand by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<BrandEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_brand_by_id");
        let result = sqlx::query_as::<_, BrandEntity>("SELECT * FROM brands WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find a brand by ID together with its product count.
    pub async fn find_with_count(
        &self,
        id: Uuid,
    ) -> Result<Option<BrandWithCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_brand_with_count");
        let sql = format!("{} WHERE b.id = $1", BRAND_WITH_COUNT_SELECT);
        let result = sqlx::query_as::<_, BrandWithCountEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// List brands, newest first.
    pub async fn list(
        &self,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BrandWithCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_brands");
        let sql = format!(
            "{} WHERE ($1::BOOLEAN IS NULL OR b.is_active = $1) \
             ORDER BY b.created_at DESC, b.id LIMIT $2 OFFSET $3",
            BRAND_WITH_COUNT_SELECT
        );
        let result = sqlx::query_as::<_, BrandWithCountEntity>(&sql)
            .bind(is_active)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Count brands matching the list filter.
    pub async fn count(&self, is_active: Option<bool>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_brands");
        let result = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM brands WHERE ($1::BOOLEAN IS NULL OR is_active = $1)",
        )
        .bind(is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partially update a brand. The slug is never changed.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<BrandEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_brand");
        let result = sqlx::query_as::<_, BrandEntity>(
            r#"
            UPDATE brands
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lock a brand row for the rest of the transaction.
    ///
    /// Serializes provisioning for one brand so get-or-create of a customer's
    /// key cannot race.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<BrandEntity>, sqlx::Error> {
        let timer = LockTimer::new("brands", LockMode::Update);
        let result =
            sqlx::query_as::<_, BrandEntity>("SELECT * FROM brands WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await;
        timer.record();
        result
    }
}
