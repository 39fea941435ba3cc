//! License entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::license::{LicenseResponse, LicenseStatus};
use domain::models::product::ProductSummary;
use domain::services::SeatUsage;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for license_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "license_status", rename_all = "lowercase")]
pub enum LicenseStatusDb {
    Active,
    Suspended,
    Cancelled,
    Expired,
}

impl From<LicenseStatusDb> for LicenseStatus {
    fn from(db_status: LicenseStatusDb) -> Self {
        match db_status {
            LicenseStatusDb::Active => LicenseStatus::Active,
            LicenseStatusDb::Suspended => LicenseStatus::Suspended,
            LicenseStatusDb::Cancelled => LicenseStatus::Cancelled,
            LicenseStatusDb::Expired => LicenseStatus::Expired,
        }
    }
}

impl From<LicenseStatus> for LicenseStatusDb {
    fn from(status: LicenseStatus) -> Self {
        match status {
            LicenseStatus::Active => LicenseStatusDb::Active,
            LicenseStatus::Suspended => LicenseStatusDb::Suspended,
            LicenseStatus::Cancelled => LicenseStatusDb::Cancelled,
            LicenseStatus::Expired => LicenseStatusDb::Expired,
        }
    }
}

/// Database row mapping for the licenses table.
#[derive(Debug, Clone, FromRow)]
pub struct LicenseEntity {
    pub id: Uuid,
    pub license_key_id: Uuid,
    pub product_id: Uuid,
    pub status: LicenseStatusDb,
    pub expiration_date: DateTime<Utc>,
    pub original_expiration_date: Option<DateTime<Utc>>,
    pub renewal_count: i32,
    pub suspension_reason: Option<String>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LicenseEntity> for domain::models::License {
    fn from(entity: LicenseEntity) -> Self {
        Self {
            id: entity.id,
            license_key_id: entity.license_key_id,
            product_id: entity.product_id,
            status: entity.status.into(),
            expiration_date: entity.expiration_date,
            original_expiration_date: entity.original_expiration_date,
            renewal_count: entity.renewal_count,
            suspension_reason: entity.suspension_reason,
            suspended_at: entity.suspended_at,
            cancellation_reason: entity.cancellation_reason,
            cancelled_at: entity.cancelled_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// License row joined with its key, product and active seat count.
#[derive(Debug, Clone, FromRow)]
pub struct LicenseDetailEntity {
    #[sqlx(flatten)]
    pub license: LicenseEntity,
    pub key: Uuid,
    pub customer_email: String,
    pub total_seats: i32,
    pub product_name: String,
    pub product_slug: String,
    pub active_seats: i64,
}

impl LicenseDetailEntity {
    /// Converts into the API representation with status and expiry evaluated at `now`.
    pub fn into_response_at(self, now: DateTime<Utc>) -> LicenseResponse {
        let usage = SeatUsage::new(self.total_seats, self.active_seats);
        let license: domain::models::License = self.license.into();
        LicenseResponse {
            id: license.id,
            license_key_id: license.license_key_id,
            license_key: self.key,
            customer_email: self.customer_email,
            product: ProductSummary {
                id: license.product_id,
                name: self.product_name,
                slug: self.product_slug,
            },
            status: license.effective_status_at(now),
            total_seats: usage.total,
            active_seats: usage.used,
            available_seats: usage.available(),
            expiration_date: license.expiration_date,
            is_expired: license.is_expired_at(now),
            original_expiration_date: license.original_expiration_date,
            renewal_count: license.renewal_count,
            suspension_reason: license.suspension_reason,
            suspended_at: license.suspended_at,
            cancellation_reason: license.cancellation_reason,
            cancelled_at: license.cancelled_at,
            created_at: license.created_at,
            updated_at: license.updated_at,
        }
    }

    pub fn into_response(self) -> LicenseResponse {
        self.into_response_at(Utc::now())
    }
}
