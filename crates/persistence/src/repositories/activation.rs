//! Activation repository for database operations.

use domain::models::Activation;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::ActivationEntity;
use crate::metrics::{LockMode, LockTimer, QueryTimer};

/// Filters accepted by the activation list endpoint.
#[derive(Debug, Clone, Default)]
pub struct ActivationFilter {
    pub license_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub instance_identifier: Option<String>,
}

/// Repository for activation database operations.
#[derive(Clone)]
pub struct ActivationRepository {
    pool: PgPool,
}

impl ActivationRepository {
    /// Creates a new ActivationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an activation by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ActivationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_activation_by_id");
        let result =
            sqlx::query_as::<_, ActivationEntity>("SELECT * FROM activations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;
        timer.record();
        result
    }

    /// List activations, most recently activated first.
    pub async fn list(
        &self,
        filter: &ActivationFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ActivationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_activations");
        let result = sqlx::query_as::<_, ActivationEntity>(
            r#"
            SELECT * FROM activations
            WHERE ($1::UUID IS NULL OR license_id = $1)
              AND ($2::BOOLEAN IS NULL OR is_active = $2)
              AND ($3::TEXT IS NULL OR instance_identifier = $3)
            ORDER BY activated_at DESC, id
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.license_id)
        .bind(filter.is_active)
        .bind(filter.instance_identifier.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count activations matching the list filter.
    pub async fn count(&self, filter: &ActivationFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_activations");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM activations
            WHERE ($1::UUID IS NULL OR license_id = $1)
              AND ($2::BOOLEAN IS NULL OR is_active = $2)
              AND ($3::TEXT IS NULL OR instance_identifier = $3)
            "#,
        )
        .bind(filter.license_id)
        .bind(filter.is_active)
        .bind(filter.instance_identifier.as_deref())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Active activation of an instance on one of the given licenses.
    pub async fn find_active_for_instance(
        &self,
        license_ids: &[Uuid],
        instance_identifier: &str,
    ) -> Result<Vec<ActivationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_activations_for_instance");
        let result = sqlx::query_as::<_, ActivationEntity>(
            r#"
            SELECT * FROM activations
            WHERE license_id = ANY($1) AND instance_identifier = $2 AND is_active
            "#,
        )
        .bind(license_ids)
        .bind(instance_identifier)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Total active activations across all licenses.
    pub async fn count_active(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_active_activations");
        let result =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM activations WHERE is_active")
                .fetch_one(&self.pool)
                .await;
        timer.record();
        result
    }

    /// Active seats held on a license. Callers hold the license row lock.
    pub async fn count_active_for_license(
        conn: &mut PgConnection,
        license_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_active_activations_for_license");
        let result = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM activations WHERE license_id = $1 AND is_active",
        )
        .bind(license_id)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// The activation row of an instance on a license, active or not.
    pub async fn find_for_instance(
        conn: &mut PgConnection,
        license_id: Uuid,
        instance_identifier: &str,
    ) -> Result<Option<ActivationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_activation_for_instance");
        let result = sqlx::query_as::<_, ActivationEntity>(
            r#"
            SELECT * FROM activations
            WHERE license_id = $1 AND instance_identifier = $2
            FOR UPDATE
            "#,
        )
        .bind(license_id)
        .bind(instance_identifier)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Insert a new active activation.
    pub async fn insert(
        conn: &mut PgConnection,
        license_id: Uuid,
        instance_identifier: &str,
        instance_type: &str,
    ) -> Result<ActivationEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_activation");
        let result = sqlx::query_as::<_, ActivationEntity>(
            r#"
            INSERT INTO activations (license_id, instance_identifier, instance_type)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(license_id)
        .bind(instance_identifier)
        .bind(instance_type)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Turn an inactive activation back on, clearing its deactivation fields.
    pub async fn reactivate(
        conn: &mut PgConnection,
        id: Uuid,
        instance_type: &str,
    ) -> Result<ActivationEntity, sqlx::Error> {
        let timer = QueryTimer::new("reactivate_activation");
        let result = sqlx::query_as::<_, ActivationEntity>(
            r#"
            UPDATE activations
            SET is_active = TRUE,
                instance_type = $2,
                activated_at = NOW(),
                deactivated_at = NULL,
                deactivation_reason = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(instance_type)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Lock an activation row for the rest of the transaction.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<ActivationEntity>, sqlx::Error> {
        let timer = LockTimer::new("activations", LockMode::Update);
        let result = sqlx::query_as::<_, ActivationEntity>(
            "SELECT * FROM activations WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Persist a deactivation decided by the seat ledger.
    pub async fn save_deactivation(
        conn: &mut PgConnection,
        activation: &Activation,
    ) -> Result<ActivationEntity, sqlx::Error> {
        let timer = QueryTimer::new("save_activation_deactivation");
        let result = sqlx::query_as::<_, ActivationEntity>(
            r#"
            UPDATE activations
            SET is_active = $2,
                deactivated_at = $3,
                deactivation_reason = $4,
                updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(activation.id)
        .bind(activation.is_active)
        .bind(activation.deactivated_at)
        .bind(activation.deactivation_reason.as_deref())
        .bind(activation.updated_at)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }
}
