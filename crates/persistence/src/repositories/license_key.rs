//! License key repository for database operations.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{LicenseKeyEntity, LicenseKeySummaryEntity};
use crate::metrics::{LockMode, LockTimer, QueryTimer};

const LICENSE_KEY_SUMMARY_SELECT: &str = r#"
    SELECT k.id, k.key, k.brand_id, k.customer_email, k.total_seats, k.is_active,
           k.created_at, k.updated_at, b.name AS brand_name,
           (SELECT COUNT(*) FROM licenses l WHERE l.license_key_id = k.id) AS license_count
    FROM license_keys k
    JOIN brands b ON b.id = k.brand_id
"#;

/// Filters accepted by the license key list endpoint.
#[derive(Debug, Clone, Default)]
pub struct LicenseKeyFilter {
    pub brand_id: Option<Uuid>,
    pub customer_email: Option<String>,
    pub is_active: Option<bool>,
}

/// Repository for license key database operations.
#[derive(Clone)]
pub struct LicenseKeyRepository {
    pool: PgPool,
}

impl LicenseKeyRepository {
    /// Creates a new LicenseKeyRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Issue a new license key. The key value is generated by the database.
    pub async fn create(
        &self,
        brand_id: Uuid,
        customer_email: &str,
        total_seats: i32,
    ) -> Result<LicenseKeyEntity, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::create_in_tx(&mut conn, brand_id, customer_email, total_seats).await
    }

    /// Issue a new license key inside a transaction.
    pub async fn create_in_tx(
        conn: &mut PgConnection,
        brand_id: Uuid,
        customer_email: &str,
        total_seats: i32,
    ) -> Result<LicenseKeyEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_license_key");
        let result = sqlx::query_as::<_, LicenseKeyEntity>(
            r#"
            INSERT INTO license_keys (brand_id, customer_email, total_seats)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(brand_id)
        .bind(customer_email)
        .bind(total_seats)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Find a license key by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<LicenseKeyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_license_key_by_id");
        let result =
            sqlx::query_as::<_, LicenseKeyEntity>("SELECT * FROM license_keys WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;
        timer.record();
        result
    }

    /// Find a license key by its customer-facing key value.
    pub async fn find_by_key(&self, key: Uuid) -> Result<Option<LicenseKeyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_license_key_by_key");
        let result =
            sqlx::query_as::<_, LicenseKeyEntity>("SELECT * FROM license_keys WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await;
        timer.record();
        result
    }

    /// Find a key by ID with brand name and license count.
    pub async fn find_summary(
        &self,
        id: Uuid,
    ) -> Result<Option<LicenseKeySummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_license_key_summary");
        let sql = format!("{} WHERE k.id = $1", LICENSE_KEY_SUMMARY_SELECT);
        let result = sqlx::query_as::<_, LicenseKeySummaryEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// List license keys, newest first.
    pub async fn list(
        &self,
        filter: &LicenseKeyFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LicenseKeySummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_license_keys");
        let sql = format!(
            "{} WHERE ($1::UUID IS NULL OR k.brand_id = $1) \
               AND ($2::TEXT IS NULL OR k.customer_email = $2) \
               AND ($3::BOOLEAN IS NULL OR k.is_active = $3) \
             ORDER BY k.created_at DESC, k.id LIMIT $4 OFFSET $5",
            LICENSE_KEY_SUMMARY_SELECT
        );
        let result = sqlx::query_as::<_, LicenseKeySummaryEntity>(&sql)
            .bind(filter.brand_id)
            .bind(filter.customer_email.as_deref())
            .bind(filter.is_active)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Count license keys matching the list filter.
    pub async fn count(&self, filter: &LicenseKeyFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_license_keys");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM license_keys
            WHERE ($1::UUID IS NULL OR brand_id = $1)
              AND ($2::TEXT IS NULL OR customer_email = $2)
              AND ($3::BOOLEAN IS NULL OR is_active = $3)
            "#,
        )
        .bind(filter.brand_id)
        .bind(filter.customer_email.as_deref())
        .bind(filter.is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All keys held by a customer across brands.
    pub async fn list_by_email(
        &self,
        customer_email: &str,
    ) -> Result<Vec<LicenseKeySummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_license_keys_by_email");
        let sql = format!(
            "{} WHERE k.customer_email = $1 ORDER BY k.created_at, k.id",
            LICENSE_KEY_SUMMARY_SELECT
        );
        let result = sqlx::query_as::<_, LicenseKeySummaryEntity>(&sql)
            .bind(customer_email)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Partially update a license key. Seat totals are not touched here.
    pub async fn update(
        &self,
        id: Uuid,
        customer_email: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<LicenseKeyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_license_key");
        let result = sqlx::query_as::<_, LicenseKeyEntity>(
            r#"
            UPDATE license_keys
            SET customer_email = COALESCE($2, customer_email),
                is_active = COALESCE($3, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(customer_email)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Oldest active key a customer holds for a brand.
    pub async fn find_active_for_customer(
        conn: &mut PgConnection,
        brand_id: Uuid,
        customer_email: &str,
    ) -> Result<Option<LicenseKeyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_license_key_for_customer");
        let result = sqlx::query_as::<_, LicenseKeyEntity>(
            r#"
            SELECT * FROM license_keys
            WHERE brand_id = $1 AND customer_email = $2 AND is_active
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(brand_id)
        .bind(customer_email)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Lock a key row exclusively (seat override).
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<LicenseKeyEntity>, sqlx::Error> {
        let timer = LockTimer::new("license_keys", LockMode::Update);
        let result = sqlx::query_as::<_, LicenseKeyEntity>(
            "SELECT * FROM license_keys WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Lock a key row shared (activation), blocking concurrent seat overrides.
    pub async fn lock_for_share(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<LicenseKeyEntity>, sqlx::Error> {
        let timer = LockTimer::new("license_keys", LockMode::Share);
        let result = sqlx::query_as::<_, LicenseKeyEntity>(
            "SELECT * FROM license_keys WHERE id = $1 FOR SHARE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Largest active activation count of any license under a key.
    pub async fn max_active_activations(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("max_active_activations_for_key");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(MAX(active_count), 0)::BIGINT FROM (
                SELECT COUNT(a.id) AS active_count
                FROM licenses l
                LEFT JOIN activations a ON a.license_id = l.id AND a.is_active
                WHERE l.license_key_id = $1
                GROUP BY l.id
            ) per_license
            "#,
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Set the seat total of a locked key.
    pub async fn set_total_seats(
        conn: &mut PgConnection,
        id: Uuid,
        total_seats: i32,
    ) -> Result<LicenseKeyEntity, sqlx::Error> {
        let timer = QueryTimer::new("set_license_key_total_seats");
        let result = sqlx::query_as::<_, LicenseKeyEntity>(
            r#"
            UPDATE license_keys
            SET total_seats = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(total_seats)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }
}
