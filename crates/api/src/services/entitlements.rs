//! Key-based operations used by customer installations: status checks and
//! activation by license key.

use chrono::{DateTime, Utc};
use domain::models::activation::{ActivateResponse, ActivationResponse};
use domain::models::service::{
    ActivateByKeyRequest, CheckStatusRequest, CheckStatusResponse, LicenseEntitlement,
};
use domain::models::{Activation, License, LicenseKey, LicenseStatus};
use domain::services::SeatUsage;
use domain::DomainError;
use persistence::entities::LicenseDetailEntity;
use persistence::repositories::{
    ActivationRepository, BrandRepository, LicenseKeyRepository, LicenseRepository,
};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::{SeatService, ServiceError};

#[derive(Clone)]
pub struct EntitlementService {
    pool: PgPool,
}

impl EntitlementService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolves an active key by its public value. Unknown and inactive keys
    /// are indistinguishable to the caller.
    async fn active_key(&self, key: Uuid) -> Result<LicenseKey, ServiceError> {
        LicenseKeyRepository::new(self.pool.clone())
            .find_by_key(key)
            .await?
            .map(LicenseKey::from)
            .filter(|k| k.is_active)
            .ok_or_else(|| DomainError::not_found("License key").into())
    }

    /// Lists the key's licenses whose effective status is active, with seat
    /// usage and, when an instance is given, that instance's activation.
    pub async fn check_status(
        &self,
        request: &CheckStatusRequest,
    ) -> Result<CheckStatusResponse, ServiceError> {
        let key = self.active_key(request.license_key).await?;
        let brand = BrandRepository::new(self.pool.clone())
            .find_by_id(key.brand_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Brand"))?;

        let licenses = LicenseRepository::new(self.pool.clone())
            .list_active_for_license_key(key.id, request.product_slug.as_deref())
            .await?;
        if licenses.is_empty() {
            return Err(DomainError::not_found("Active license").into());
        }

        let mut activations: HashMap<Uuid, Activation> = HashMap::new();
        if let Some(instance) = request.instance_identifier.as_deref().map(str::trim) {
            let ids: Vec<Uuid> = licenses.iter().map(|l| l.license.id).collect();
            for entity in ActivationRepository::new(self.pool.clone())
                .find_active_for_instance(&ids, instance)
                .await?
            {
                activations.insert(entity.license_id, entity.into());
            }
        }

        let now = Utc::now();
        let entitlements = licenses
            .into_iter()
            .map(|detail| {
                let activation = activations
                    .remove(&detail.license.id)
                    .map(ActivationResponse::from);
                entitlement(detail, activation, now)
            })
            .collect();

        tracing::debug!(license_key_id = %key.id, "License status checked");

        Ok(CheckStatusResponse {
            valid: true,
            license_key: key.key,
            customer_email: key.customer_email,
            brand: brand.name,
            licenses: entitlements,
        })
    }

    /// Resolves the key's license for the product and claims a seat on it.
    ///
    /// When several licenses exist for the product, the first whose effective
    /// status is active is used; otherwise the oldest one, so the seat ledger
    /// reports why it cannot be activated.
    pub async fn activate_by_key(
        &self,
        request: &ActivateByKeyRequest,
    ) -> Result<ActivateResponse, ServiceError> {
        let key = self.active_key(request.license_key).await?;
        let candidates: Vec<LicenseDetailEntity> = LicenseRepository::new(self.pool.clone())
            .list_for_license_key(key.id)
            .await?
            .into_iter()
            .filter(|l| l.product_slug == request.product_slug)
            .collect();

        let now = Utc::now();
        let license_id = candidates
            .iter()
            .find(|l| {
                License::from(l.license.clone()).effective_status_at(now) == LicenseStatus::Active
            })
            .or_else(|| candidates.first())
            .map(|l| l.license.id)
            .ok_or_else(|| DomainError::not_found("License for product"))?;

        SeatService::new(self.pool.clone())
            .activate(license_id, &request.instance_identifier, &request.instance_type)
            .await
    }
}

fn entitlement(
    detail: LicenseDetailEntity,
    activation: Option<ActivationResponse>,
    now: DateTime<Utc>,
) -> LicenseEntitlement {
    let usage = SeatUsage::new(detail.total_seats, detail.active_seats);
    let product = detail.product_name.clone();
    let product_slug = detail.product_slug.clone();
    let license = detail.into_response_at(now);

    LicenseEntitlement {
        license_id: license.id,
        product,
        product_slug,
        status: license.status,
        total_seats: usage.total,
        available_seats: usage.available(),
        expiration_date: license.expiration_date,
        is_expired: license.is_expired,
        activation,
    }
}
