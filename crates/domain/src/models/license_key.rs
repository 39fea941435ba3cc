//! License key domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::license::LicenseResponse;
use super::product::ProductSummary;

/// A purchased grant of seats issued to a customer under one brand.
///
/// `total_seats` is shared by every license under the key and only changes
/// through an explicit seat override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseKey {
    pub id: Uuid,
    pub key: Uuid,
    pub brand_id: Uuid,
    pub customer_email: String,
    pub total_seats: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_total_seats() -> i32 {
    1
}

/// Request payload for issuing a license key. The key itself is generated.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLicenseKeyRequest {
    pub brand_id: Uuid,

    #[validate(custom(function = "shared::validation::validate_customer_email"))]
    pub customer_email: String,

    #[serde(default = "default_total_seats")]
    #[validate(custom(function = "shared::validation::validate_total_seats"))]
    pub total_seats: i32,
}

/// Request payload for updating a license key (partial update).
///
/// Seat totals are changed through [`SeatOverrideRequest`] only.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateLicenseKeyRequest {
    #[validate(custom(function = "shared::validation::validate_customer_email"))]
    pub customer_email: Option<String>,

    pub is_active: Option<bool>,
}

/// Admin request to override the seat total of a key.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SeatOverrideRequest {
    #[validate(custom(function = "shared::validation::validate_total_seats"))]
    pub total_seats: i32,

    #[validate(length(max = 500, message = "Reason cannot exceed 500 characters"))]
    pub reason: Option<String>,
}

/// Query parameters for listing license keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListLicenseKeysQuery {
    pub brand_id: Option<Uuid>,
    pub customer_email: Option<String>,
    pub is_active: Option<bool>,
}

/// Query parameters for looking up keys by customer.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LicenseKeysByEmailQuery {
    #[validate(custom(function = "shared::validation::validate_customer_email"))]
    pub email: String,
}

/// Response payload for license key operations.
#[derive(Debug, Clone, Serialize)]
pub struct LicenseKeyResponse {
    pub id: Uuid,
    pub key: Uuid,
    pub brand_id: Uuid,
    pub brand_name: String,
    pub customer_email: String,
    pub total_seats: i32,
    pub is_active: bool,
    pub license_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LicenseKeyResponse {
    pub fn new(key: LicenseKey, brand_name: String, license_count: i64) -> Self {
        Self {
            id: key.id,
            key: key.key,
            brand_id: key.brand_id,
            brand_name,
            customer_email: key.customer_email,
            total_seats: key.total_seats,
            is_active: key.is_active,
            license_count,
            created_at: key.created_at,
            updated_at: key.updated_at,
        }
    }
}

/// Seat usage of one license under a key.
#[derive(Debug, Clone, Serialize)]
pub struct LicenseSeatSummary {
    pub license_id: Uuid,
    pub product_slug: String,
    pub active_seats: i64,
    pub available_seats: i64,
}

/// Detailed key view with its licenses and associated products.
#[derive(Debug, Clone, Serialize)]
pub struct LicenseKeyDetailResponse {
    #[serde(flatten)]
    pub key: LicenseKeyResponse,
    pub products: Vec<ProductSummary>,
    pub licenses: Vec<LicenseResponse>,
    pub seats: Vec<LicenseSeatSummary>,
}
