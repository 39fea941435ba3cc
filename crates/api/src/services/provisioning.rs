//! License issuance: provisioning for a customer and issuing under an existing key.

use chrono::{DateTime, Utc};
use domain::models::license::LicenseResponse;
use domain::models::license_key::LicenseKeyResponse;
use domain::models::service::{ProvisionRequest, ProvisionResponse};
use domain::models::{LicenseKey, Product};
use domain::DomainError;
use persistence::metrics::{TxKind, TxTimer};
use persistence::entities::LicenseKeySummaryEntity;
use persistence::repositories::{
    BrandRepository, LicenseKeyRepository, LicenseRepository, ProductRepository,
};
use shared::validation::normalize_email;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::ServiceError;

const DEFAULT_TOTAL_SEATS: i32 = 1;

#[derive(Clone)]
pub struct ProvisioningService {
    pool: PgPool,
}

impl ProvisioningService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get-or-create the customer's key for the brand, then issue an active
    /// license for the product, in one transaction.
    ///
    /// The brand row is locked `FOR UPDATE` so two provisions for the same
    /// customer cannot both create a key. `total_seats` only applies when a
    /// new key is created.
    pub async fn provision(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisionResponse, ServiceError> {
        let email = normalize_email(&request.customer_email);
        let timer = TxTimer::start(TxKind::Provision);
        let mut tx = self.pool.begin().await?;

        let brand = BrandRepository::lock_for_update(&mut *tx, request.brand_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Brand"))?;
        if !brand.is_active {
            return Err(DomainError::validation("Brand is inactive").into());
        }
        let product = product_for_brand(&mut *tx, request.product_id, brand.id).await?;

        let (key, key_created) =
            match LicenseKeyRepository::find_active_for_customer(&mut *tx, brand.id, &email)
                .await?
            {
                Some(existing) => (existing, false),
                None => {
                    let seats = request.total_seats.unwrap_or(DEFAULT_TOTAL_SEATS);
                    let created =
                        LicenseKeyRepository::create_in_tx(&mut *tx, brand.id, &email, seats)
                            .await?;
                    (created, true)
                }
            };

        let license = issue(&mut *tx, key.id, product.id, request.expiration_date).await?;
        tx.commit().await?;
        timer.committed();

        tracing::info!(
            brand_id = %brand.id,
            product = %product.slug,
            license_key_id = %key.id,
            license_id = %license.id,
            key_created,
            "License provisioned"
        );

        let summary = self.key_summary(key.id).await?;
        Ok(ProvisionResponse {
            key_created,
            license_key: key_response(summary),
            license,
        })
    }

    /// Issues an active license under an existing key. The product must belong
    /// to the key's brand.
    pub async fn issue_license(
        &self,
        license_key_id: Uuid,
        product_id: Uuid,
        expiration_date: DateTime<Utc>,
    ) -> Result<LicenseResponse, ServiceError> {
        let timer = TxTimer::start(TxKind::IssueLicense);
        let mut tx = self.pool.begin().await?;

        let key: LicenseKey = LicenseKeyRepository::lock_for_share(&mut *tx, license_key_id)
            .await?
            .ok_or_else(|| DomainError::not_found("License key"))?
            .into();
        let product = product_for_brand(&mut *tx, product_id, key.brand_id).await?;

        let license = issue(&mut *tx, key.id, product.id, expiration_date).await?;
        tx.commit().await?;
        timer.committed();

        tracing::info!(
            license_key_id = %key.id,
            license_id = %license.id,
            product = %product.slug,
            "License issued"
        );
        Ok(license)
    }

    async fn key_summary(&self, id: Uuid) -> Result<LicenseKeySummaryEntity, ServiceError> {
        Ok(LicenseKeyRepository::new(self.pool.clone())
            .find_summary(id)
            .await?
            .ok_or_else(|| DomainError::not_found("License key"))?)
    }
}

fn key_response(summary: LicenseKeySummaryEntity) -> LicenseKeyResponse {
    LicenseKeyResponse::new(summary.key.into(), summary.brand_name, summary.license_count)
}

/// Loads an active product and checks it belongs to `brand_id`.
async fn product_for_brand(
    conn: &mut PgConnection,
    product_id: Uuid,
    brand_id: Uuid,
) -> Result<Product, ServiceError> {
    let product: Product = ProductRepository::find_in_tx(conn, product_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Product"))?
        .into();
    if product.brand_id != brand_id {
        return Err(DomainError::validation("Product does not belong to the license key's brand").into());
    }
    if !product.is_active {
        return Err(DomainError::validation("Product is inactive").into());
    }
    Ok(product)
}

async fn issue(
    conn: &mut PgConnection,
    license_key_id: Uuid,
    product_id: Uuid,
    expiration_date: DateTime<Utc>,
) -> Result<LicenseResponse, ServiceError> {
    if expiration_date <= Utc::now() {
        return Err(DomainError::validation("Expiration date must be in the future").into());
    }
    let license =
        LicenseRepository::create_in_tx(&mut *conn, license_key_id, product_id, expiration_date)
            .await?;
    let detail = LicenseRepository::find_detail_in_tx(&mut *conn, license.id)
        .await?
        .ok_or_else(|| DomainError::not_found("License"))?;
    Ok(detail.into_response())
}
