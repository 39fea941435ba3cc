//! License event repository for the append-only audit trail.

use domain::services::TransitionRecord;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{LicenseEventEntity, LicenseOperationDb, LicenseStatusDb};
use crate::metrics::QueryTimer;

/// Repository for license audit events. Events are only ever inserted.
#[derive(Clone)]
pub struct LicenseEventRepository {
    pool: PgPool,
}

impl LicenseEventRepository {
    /// Creates a new LicenseEventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append the audit record of a transition in the transaction that applied it.
    pub async fn append(
        conn: &mut PgConnection,
        license_id: Uuid,
        actor: &str,
        record: &TransitionRecord,
    ) -> Result<LicenseEventEntity, sqlx::Error> {
        let timer = QueryTimer::new("append_license_event");
        let result = sqlx::query_as::<_, LicenseEventEntity>(
            r#"
            INSERT INTO license_events
                (license_id, operation, actor, from_status, to_status, reason, details, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(license_id)
        .bind(LicenseOperationDb::from(record.operation))
        .bind(actor)
        .bind(LicenseStatusDb::from(record.from))
        .bind(LicenseStatusDb::from(record.to))
        .bind(record.reason.as_deref())
        .bind(&record.details)
        .bind(record.occurred_at)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Full history of a license in the order it happened.
    pub async fn list_for_license(
        &self,
        license_id: Uuid,
    ) -> Result<Vec<LicenseEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_license_events");
        let result = sqlx::query_as::<_, LicenseEventEntity>(
            r#"
            SELECT * FROM license_events
            WHERE license_id = $1
            ORDER BY occurred_at, id
            "#,
        )
        .bind(license_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
