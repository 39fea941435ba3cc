//! License repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::License;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{LicenseDetailEntity, LicenseEntity, LicenseStatusDb};
use crate::metrics::{LockMode, LockTimer, QueryTimer};

/// Status a client sees: stored status with read-time expiry applied.
const EFFECTIVE_STATUS_SQL: &str = "CASE WHEN l.status IN ('active', 'suspended') \
     AND l.expiration_date < NOW() THEN 'expired'::license_status ELSE l.status END";

const LICENSE_DETAIL_SELECT: &str = r#"
    SELECT l.id, l.license_key_id, l.product_id, l.status, l.expiration_date,
           l.original_expiration_date, l.renewal_count, l.suspension_reason,
           l.suspended_at, l.cancellation_reason, l.cancelled_at,
           l.created_at, l.updated_at,
           k.key, k.customer_email, k.total_seats,
           p.name AS product_name, p.slug AS product_slug,
           (SELECT COUNT(*) FROM activations a
             WHERE a.license_id = l.id AND a.is_active) AS active_seats
    FROM licenses l
    JOIN license_keys k ON k.id = l.license_key_id
    JOIN products p ON p.id = l.product_id
"#;

/// Filters accepted by the license list endpoint.
#[derive(Debug, Clone, Default)]
pub struct LicenseFilter {
    /// Matches the effective status.
    pub status: Option<LicenseStatusDb>,
    pub product_id: Option<Uuid>,
    pub license_key_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub customer_email: Option<String>,
}

fn filter_clause() -> String {
    format!(
        "WHERE ($1::license_status IS NULL OR {} = $1) \
           AND ($2::UUID IS NULL OR l.product_id = $2) \
           AND ($3::UUID IS NULL OR l.license_key_id = $3) \
           AND ($4::UUID IS NULL OR k.brand_id = $4) \
           AND ($5::TEXT IS NULL OR k.customer_email = $5)",
        EFFECTIVE_STATUS_SQL
    )
}

/// Repository for license database operations.
#[derive(Clone)]
pub struct LicenseRepository {
    pool: PgPool,
}

impl LicenseRepository {
    /// Creates a new LicenseRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Issue an active license inside a transaction.
    pub async fn create_in_tx(
        conn: &mut PgConnection,
        license_key_id: Uuid,
        product_id: Uuid,
        expiration_date: DateTime<Utc>,
    ) -> Result<LicenseEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_license");
        let result = sqlx::query_as::<_, LicenseEntity>(
            r#"
            INSERT INTO licenses (license_key_id, product_id, status, expiration_date)
            VALUES ($1, $2, 'active', $3)
            RETURNING *
            "#,
        )
        .bind(license_key_id)
        .bind(product_id)
        .bind(expiration_date)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Find a license by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<LicenseEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_license_by_id");
        let result = sqlx::query_as::<_, LicenseEntity>("SELECT * FROM licenses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find a license with its key, product and seat usage.
    pub async fn find_detail(&self, id: Uuid) -> Result<Option<LicenseDetailEntity>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::find_detail_in_tx(&mut conn, id).await
    }

    /// Find a license detail row inside a transaction, seeing its uncommitted writes.
    pub async fn find_detail_in_tx(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<LicenseDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_license_detail");
        let sql = format!("{} WHERE l.id = $1", LICENSE_DETAIL_SELECT);
        let result = sqlx::query_as::<_, LicenseDetailEntity>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await;
        timer.record();
        result
    }

    /// List licenses, newest first.
    pub async fn list(
        &self,
        filter: &LicenseFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LicenseDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_licenses");
        let sql = format!(
            "{} {} ORDER BY l.created_at DESC, l.id LIMIT $6 OFFSET $7",
            LICENSE_DETAIL_SELECT,
            filter_clause()
        );
        let result = sqlx::query_as::<_, LicenseDetailEntity>(&sql)
            .bind(filter.status)
            .bind(filter.product_id)
            .bind(filter.license_key_id)
            .bind(filter.brand_id)
            .bind(filter.customer_email.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Count licenses matching the list filter.
    pub async fn count(&self, filter: &LicenseFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_licenses");
        let sql = format!(
            "SELECT COUNT(*) FROM licenses l \
             JOIN license_keys k ON k.id = l.license_key_id {}",
            filter_clause()
        );
        let result = sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.status)
            .bind(filter.product_id)
            .bind(filter.license_key_id)
            .bind(filter.brand_id)
            .bind(filter.customer_email.as_deref())
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// All licenses under a key, oldest first.
    pub async fn list_for_license_key(
        &self,
        license_key_id: Uuid,
    ) -> Result<Vec<LicenseDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_licenses_for_license_key");
        let sql = format!(
            "{} WHERE l.license_key_id = $1 ORDER BY l.created_at, l.id",
            LICENSE_DETAIL_SELECT
        );
        let result = sqlx::query_as::<_, LicenseDetailEntity>(&sql)
            .bind(license_key_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Licenses under a key whose effective status is active, optionally for one product.
    pub async fn list_active_for_license_key(
        &self,
        license_key_id: Uuid,
        product_slug: Option<&str>,
    ) -> Result<Vec<LicenseDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_active_licenses_for_license_key");
        let sql = format!(
            "{} WHERE l.license_key_id = $1 \
               AND ($2::TEXT IS NULL OR p.slug = $2) \
               AND {} = 'active' \
             ORDER BY l.created_at, l.id",
            LICENSE_DETAIL_SELECT, EFFECTIVE_STATUS_SQL
        );
        let result = sqlx::query_as::<_, LicenseDetailEntity>(&sql)
            .bind(license_key_id)
            .bind(product_slug)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// License counts grouped by effective status.
    pub async fn count_by_effective_status(
        &self,
    ) -> Result<Vec<(LicenseStatusDb, i64)>, sqlx::Error> {
        let timer = QueryTimer::new("count_licenses_by_status");
        let sql = format!(
            "SELECT {status} AS status, COUNT(*) AS total FROM licenses l GROUP BY {status}",
            status = EFFECTIVE_STATUS_SQL
        );
        let result = sqlx::query_as::<_, (LicenseStatusDb, i64)>(&sql)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Lock a license row for the rest of the transaction.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<LicenseEntity>, sqlx::Error> {
        let timer = LockTimer::new("licenses", LockMode::Update);
        let result =
            sqlx::query_as::<_, LicenseEntity>("SELECT * FROM licenses WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await;
        timer.record();
        result
    }

    /// Persist the lifecycle fields of a license after a transition.
    pub async fn save_lifecycle(
        conn: &mut PgConnection,
        license: &License,
    ) -> Result<LicenseEntity, sqlx::Error> {
        let timer = QueryTimer::new("save_license_lifecycle");
        let result = sqlx::query_as::<_, LicenseEntity>(
            r#"
            UPDATE licenses
            SET status = $2,
                expiration_date = $3,
                original_expiration_date = $4,
                renewal_count = $5,
                suspension_reason = $6,
                suspended_at = $7,
                cancellation_reason = $8,
                cancelled_at = $9,
                updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(license.id)
        .bind(LicenseStatusDb::from(license.status))
        .bind(license.expiration_date)
        .bind(license.original_expiration_date)
        .bind(license.renewal_count)
        .bind(license.suspension_reason.as_deref())
        .bind(license.suspended_at)
        .bind(license.cancellation_reason.as_deref())
        .bind(license.cancelled_at)
        .bind(license.updated_at)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }
}
