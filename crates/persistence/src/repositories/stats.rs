//! Aggregate counts for the admin statistics endpoint.

use sqlx::{FromRow, PgPool};

use crate::metrics::QueryTimer;

/// Registry-wide row counts.
#[derive(Debug, Clone, FromRow)]
pub struct RegistryCountsEntity {
    pub brands: i64,
    pub active_brands: i64,
    pub products: i64,
    pub license_keys: i64,
}

/// Repository for admin statistics.
#[derive(Clone)]
pub struct StatsRepository {
    pool: PgPool,
}

impl StatsRepository {
    /// Creates a new StatsRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count brands, products and license keys in one round trip.
    pub async fn registry_counts(&self) -> Result<RegistryCountsEntity, sqlx::Error> {
        let timer = QueryTimer::new("registry_counts");
        let result = sqlx::query_as::<_, RegistryCountsEntity>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM brands) AS brands,
                (SELECT COUNT(*) FROM brands WHERE is_active) AS active_brands,
                (SELECT COUNT(*) FROM products) AS products,
                (SELECT COUNT(*) FROM license_keys) AS license_keys
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
