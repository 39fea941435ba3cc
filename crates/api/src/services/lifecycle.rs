//! License lifecycle transitions.

use chrono::Utc;
use domain::models::license::LicenseResponse;
use domain::models::License;
use domain::services::{self as rules, LifecycleCommand};
use domain::DomainError;
use persistence::metrics::{TxKind, TxTimer};
use persistence::repositories::{LicenseEventRepository, LicenseRepository};
use sqlx::PgPool;
use uuid::Uuid;

use super::ServiceError;
use crate::middleware::metrics;

/// Applies renew, suspend, resume and cancel to stored licenses.
#[derive(Clone)]
pub struct LifecycleService {
    pool: PgPool,
}

impl LifecycleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs one transition under a row lock and appends its audit entry in
    /// the same transaction.
    pub async fn transition(
        &self,
        license_id: Uuid,
        command: LifecycleCommand,
        actor: &str,
    ) -> Result<LicenseResponse, ServiceError> {
        let operation = command.operation();
        let timer = TxTimer::start(TxKind::Transition);
        let mut tx = self.pool.begin().await?;

        let mut license: License = LicenseRepository::lock_for_update(&mut *tx, license_id)
            .await?
            .ok_or_else(|| DomainError::not_found("License"))?
            .into();

        let now = Utc::now();
        let record = match rules::apply(&mut license, command, now) {
            Ok(record) => record,
            Err(err) => {
                tracing::info!(
                    license_id = %license_id,
                    operation = %operation,
                    actor = %actor,
                    error = %err,
                    "License transition rejected"
                );
                return Err(err.into());
            }
        };

        LicenseRepository::save_lifecycle(&mut *tx, &license).await?;
        LicenseEventRepository::append(&mut *tx, license.id, actor, &record).await?;

        let detail = LicenseRepository::find_detail_in_tx(&mut *tx, license.id)
            .await?
            .ok_or_else(|| DomainError::not_found("License"))?;
        tx.commit().await?;
        timer.committed();

        metrics::record_transition(operation);
        tracing::info!(
            license_id = %license_id,
            operation = %operation,
            from = %record.from,
            to = %record.to,
            actor = %actor,
            "License transition applied"
        );

        Ok(detail.into_response_at(now))
    }
}
