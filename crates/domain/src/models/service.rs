//! Request and response types for the service endpoints used by brand
//! backends and installed products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::activation::ActivationResponse;
use super::license::{LicenseResponse, LicenseStatus};
use super::license_key::LicenseKeyResponse;

/// Request payload for checking the entitlements of a key.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckStatusRequest {
    pub license_key: Uuid,

    #[validate(custom(function = "shared::validation::validate_slug"))]
    pub product_slug: Option<String>,

    #[validate(custom(function = "shared::validation::validate_instance_identifier"))]
    pub instance_identifier: Option<String>,
}

/// Entitlement of one active license returned by a status check.
#[derive(Debug, Clone, Serialize)]
pub struct LicenseEntitlement {
    pub license_id: Uuid,
    pub product: String,
    pub product_slug: String,
    pub status: LicenseStatus,
    pub total_seats: i32,
    pub available_seats: i64,
    pub expiration_date: DateTime<Utc>,
    pub is_expired: bool,
    /// Present when the request named an instance that holds a seat on this license.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation: Option<ActivationResponse>,
}

/// Response payload for a status check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckStatusResponse {
    pub valid: bool,
    pub license_key: Uuid,
    pub customer_email: String,
    pub brand: String,
    pub licenses: Vec<LicenseEntitlement>,
}

fn default_instance_type() -> String {
    "url".to_string()
}

/// Request payload for activating an instance by key and product slug.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ActivateByKeyRequest {
    pub license_key: Uuid,

    #[validate(custom(function = "shared::validation::validate_slug"))]
    pub product_slug: String,

    #[validate(custom(function = "shared::validation::validate_instance_identifier"))]
    pub instance_identifier: String,

    #[serde(default = "default_instance_type")]
    #[validate(length(min = 1, max = 50, message = "Instance type must be 1-50 characters"))]
    pub instance_type: String,
}

/// Request payload for provisioning a license from a brand backend.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProvisionRequest {
    #[validate(custom(function = "shared::validation::validate_customer_email"))]
    pub customer_email: String,

    pub brand_id: Uuid,

    pub product_id: Uuid,

    #[validate(custom(function = "shared::validation::validate_future_timestamp"))]
    pub expiration_date: DateTime<Utc>,

    /// Seat total for a newly issued key. Ignored when the customer already
    /// holds a key for the brand.
    #[validate(custom(function = "shared::validation::validate_total_seats"))]
    pub total_seats: Option<i32>,
}

/// Response payload for provisioning.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionResponse {
    pub key_created: bool,
    pub license_key: LicenseKeyResponse,
    pub license: LicenseResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status_optional_fields() {
        let json = serde_json::json!({ "license_key": Uuid::new_v4() });
        let req: CheckStatusRequest = serde_json::from_value(json).unwrap();
        assert!(req.product_slug.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_check_status_validates_slug() {
        let json = serde_json::json!({ "license_key": Uuid::new_v4(), "product_slug": "Bad Slug" });
        let req: CheckStatusRequest = serde_json::from_value(json).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_activate_by_key_requires_fields() {
        let json = serde_json::json!({ "license_key": Uuid::new_v4(), "product_slug": "rankmath" });
        let result: Result<ActivateByKeyRequest, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_provision_request_validation() {
        let json = serde_json::json!({
            "customer_email": "buyer@example.com",
            "brand_id": Uuid::new_v4(),
            "product_id": Uuid::new_v4(),
            "expiration_date": Utc::now() + chrono::Duration::days(365),
            "total_seats": 3,
        });
        let req: ProvisionRequest = serde_json::from_value(json).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_provision_request_accepts_padded_email() {
        let json = serde_json::json!({
            "customer_email": "  USER@EXAMPLE.COM  ",
            "brand_id": Uuid::new_v4(),
            "product_id": Uuid::new_v4(),
            "expiration_date": Utc::now() + chrono::Duration::days(365),
        });
        let req: ProvisionRequest = serde_json::from_value(json).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_provision_request_rejects_negative_seats() {
        let json = serde_json::json!({
            "customer_email": "buyer@example.com",
            "brand_id": Uuid::new_v4(),
            "product_id": Uuid::new_v4(),
            "expiration_date": Utc::now() + chrono::Duration::days(365),
            "total_seats": -2,
        });
        let req: ProvisionRequest = serde_json::from_value(json).unwrap();
        assert!(req.validate().is_err());
    }
}
