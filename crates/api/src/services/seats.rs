//! Seat ledger operations: activation, deactivation and seat overrides.

use chrono::Utc;
use domain::models::activation::{ActivateResponse, ActivationResponse, MAX_BULK_DEACTIVATE};
use domain::models::license_key::LicenseKeyResponse;
use domain::models::{Activation, License, LicenseKey};
use domain::services::{
    self as rules, ActivationPlan, BulkDeactivateReport, BulkItemStatus, SeatUsage,
};
use domain::DomainError;
use persistence::metrics::{TxKind, TxTimer};
use persistence::repositories::{ActivationRepository, LicenseKeyRepository, LicenseRepository};
use sqlx::PgPool;
use uuid::Uuid;

use super::ServiceError;
use crate::middleware::metrics;

/// Claims and releases seats against a license key's seat total.
#[derive(Clone)]
pub struct SeatService {
    pool: PgPool,
}

impl SeatService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Claims a seat on `license_id` for `instance_identifier`.
    ///
    /// The license row is locked `FOR UPDATE` and its key `FOR SHARE` before
    /// counting, so concurrent claims for the last seat serialize and exactly
    /// one of them succeeds.
    pub async fn activate(
        &self,
        license_id: Uuid,
        instance_identifier: &str,
        instance_type: &str,
    ) -> Result<ActivateResponse, ServiceError> {
        let instance = instance_identifier.trim();
        let timer = TxTimer::start(TxKind::Activate);
        let mut tx = self.pool.begin().await?;

        let license: License = LicenseRepository::lock_for_update(&mut *tx, license_id)
            .await?
            .ok_or_else(|| DomainError::not_found("License"))?
            .into();
        let key: LicenseKey = LicenseKeyRepository::lock_for_share(&mut *tx, license.license_key_id)
            .await?
            .ok_or_else(|| DomainError::not_found("License key"))?
            .into();

        let used = ActivationRepository::count_active_for_license(&mut *tx, license_id).await?;
        let existing: Option<Activation> =
            ActivationRepository::find_for_instance(&mut *tx, license_id, instance)
                .await?
                .map(Into::into);

        let usage = SeatUsage::new(key.total_seats, used);
        let plan = match rules::plan_activation(
            &license,
            &key,
            usage,
            existing.as_ref(),
            instance,
            Utc::now(),
        ) {
            Ok(plan) => plan,
            Err(err) => {
                metrics::record_activation_rejection(err.kind());
                tracing::info!(
                    license_id = %license_id,
                    instance = %instance,
                    total_seats = usage.total,
                    used_seats = usage.used,
                    error = %err,
                    "Activation rejected"
                );
                return Err(err.into());
            }
        };

        let (entity, reactivated) = match plan {
            ActivationPlan::Create => (
                ActivationRepository::insert(&mut *tx, license_id, instance, instance_type).await?,
                false,
            ),
            ActivationPlan::Reactivate { activation_id } => (
                ActivationRepository::reactivate(&mut *tx, activation_id, instance_type).await?,
                true,
            ),
        };
        tx.commit().await?;
        timer.committed();

        let after = SeatUsage::new(key.total_seats, used + 1);
        metrics::record_activation(reactivated);
        tracing::info!(
            license_id = %license_id,
            activation_id = %entity.id,
            instance = %instance,
            reactivated,
            available_seats = after.available(),
            "Seat activated"
        );

        Ok(ActivateResponse {
            activation: Activation::from(entity).into(),
            reactivated,
            total_seats: key.total_seats,
            available_seats: after.available(),
        })
    }

    /// Releases the seat held by an activation.
    pub async fn deactivate(
        &self,
        activation_id: Uuid,
        reason: Option<String>,
    ) -> Result<ActivationResponse, ServiceError> {
        let timer = TxTimer::start(TxKind::Deactivate);
        let mut tx = self.pool.begin().await?;

        let mut activation: Activation =
            ActivationRepository::lock_for_update(&mut *tx, activation_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Activation"))?
                .into();

        rules::deactivate(&mut activation, reason, Utc::now())?;
        let saved = ActivationRepository::save_deactivation(&mut *tx, &activation).await?;
        tx.commit().await?;
        timer.committed();

        metrics::record_deactivations(1);
        tracing::info!(
            activation_id = %activation_id,
            license_id = %activation.license_id,
            instance = %activation.instance_identifier,
            "Seat released"
        );

        Ok(Activation::from(saved).into())
    }

    /// Deactivates each id independently and reports a result per id.
    ///
    /// A missing or already inactive activation is reported, not raised;
    /// only database failures abort the batch.
    pub async fn bulk_deactivate(
        &self,
        activation_ids: &[Uuid],
        reason: Option<String>,
    ) -> Result<BulkDeactivateReport, ServiceError> {
        if activation_ids.is_empty() || activation_ids.len() > MAX_BULK_DEACTIVATE {
            return Err(DomainError::validation(format!(
                "Between 1 and {} activation ids are required",
                MAX_BULK_DEACTIVATE
            ))
            .into());
        }

        let mut report = BulkDeactivateReport::default();
        for &id in activation_ids {
            let status = match self.deactivate(id, reason.clone()).await {
                Ok(_) => BulkItemStatus::Deactivated,
                Err(ServiceError::Domain(DomainError::AlreadyInactive)) => {
                    BulkItemStatus::AlreadyInactive
                }
                Err(ServiceError::Domain(DomainError::NotFound(_))) => BulkItemStatus::NotFound,
                Err(err) => return Err(err),
            };
            report.push(id, status);
        }

        tracing::info!(
            requested = activation_ids.len(),
            deactivated = report.deactivated_count,
            "Bulk deactivation finished"
        );
        Ok(report)
    }

    /// Sets a key's seat total. Rejected when any license under the key
    /// already has more active activations than the new total.
    pub async fn override_seats(
        &self,
        license_key_id: Uuid,
        total_seats: i32,
        reason: Option<&str>,
        actor: &str,
    ) -> Result<LicenseKeyResponse, ServiceError> {
        let timer = TxTimer::start(TxKind::SeatOverride);
        let mut tx = self.pool.begin().await?;

        let key: LicenseKey = LicenseKeyRepository::lock_for_update(&mut *tx, license_key_id)
            .await?
            .ok_or_else(|| DomainError::not_found("License key"))?
            .into();

        let max_active = LicenseKeyRepository::max_active_activations(&mut *tx, key.id).await?;
        rules::check_seat_override(total_seats, max_active)?;
        LicenseKeyRepository::set_total_seats(&mut *tx, key.id, total_seats).await?;
        tx.commit().await?;
        timer.committed();

        tracing::info!(
            license_key_id = %key.id,
            previous_total = key.total_seats,
            new_total = total_seats,
            max_active,
            actor = %actor,
            reason = reason.unwrap_or_default(),
            "Seat total overridden"
        );

        let summary = LicenseKeyRepository::new(self.pool.clone())
            .find_summary(key.id)
            .await?
            .ok_or_else(|| DomainError::not_found("License key"))?;
        Ok(LicenseKeyResponse::new(
            summary.key.into(),
            summary.brand_name,
            summary.license_count,
        ))
    }
}
