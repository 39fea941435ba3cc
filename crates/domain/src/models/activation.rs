//! Activation domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Maximum number of activations accepted by a single bulk deactivation.
pub const MAX_BULK_DEACTIVATE: usize = 100;

/// A record that an instance (site URL, host, machine id) holds a seat.
///
/// Rows are never deleted; only active rows count against the seat total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activation {
    pub id: Uuid,
    pub license_id: Uuid,
    pub instance_identifier: String,
    pub instance_type: String,
    pub is_active: bool,
    pub activated_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_instance_type() -> String {
    "url".to_string()
}

/// Request payload for claiming a seat on a license.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ActivateRequest {
    #[validate(custom(function = "shared::validation::validate_instance_identifier"))]
    pub instance_identifier: String,

    #[serde(default = "default_instance_type")]
    #[validate(length(min = 1, max = 50, message = "Instance type must be 1-50 characters"))]
    pub instance_type: String,
}

/// Request payload for releasing a seat.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DeactivateRequest {
    #[validate(length(max = 500, message = "Reason cannot exceed 500 characters"))]
    pub reason: Option<String>,
}

/// Request payload for releasing many seats at once.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkDeactivateRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Between 1 and 100 activation ids are required"
    ))]
    pub activation_ids: Vec<Uuid>,

    #[validate(length(max = 500, message = "Reason cannot exceed 500 characters"))]
    pub reason: Option<String>,
}

/// Query parameters for listing activations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListActivationsQuery {
    pub license_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub instance_identifier: Option<String>,
}

/// Response payload for activation operations.
#[derive(Debug, Clone, Serialize)]
pub struct ActivationResponse {
    pub id: Uuid,
    pub license_id: Uuid,
    pub instance_identifier: String,
    pub instance_type: String,
    pub is_active: bool,
    pub activated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivation_reason: Option<String>,
}

impl From<Activation> for ActivationResponse {
    fn from(a: Activation) -> Self {
        Self {
            id: a.id,
            license_id: a.license_id,
            instance_identifier: a.instance_identifier,
            instance_type: a.instance_type,
            is_active: a.is_active,
            activated_at: a.activated_at,
            deactivated_at: a.deactivated_at,
            deactivation_reason: a.deactivation_reason,
        }
    }
}

/// Activation result including the remaining seat count.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateResponse {
    pub activation: ActivationResponse,
    pub reactivated: bool,
    pub total_seats: i32,
    pub available_seats: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activate_request_defaults_instance_type() {
        let req: ActivateRequest =
            serde_json::from_str(r#"{"instance_identifier":"https://example.com"}"#).unwrap();
        assert_eq!(req.instance_type, "url");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_activate_request_rejects_blank_identifier() {
        let req: ActivateRequest = serde_json::from_str(r#"{"instance_identifier":"  "}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("instance_identifier"));
    }

    #[test]
    fn test_bulk_request_bounds() {
        let empty: BulkDeactivateRequest =
            serde_json::from_str(r#"{"activation_ids":[]}"#).unwrap();
        assert!(empty.validate().is_err());

        let ids: Vec<Uuid> = (0..MAX_BULK_DEACTIVATE).map(|_| Uuid::new_v4()).collect();
        let full = BulkDeactivateRequest {
            activation_ids: ids.clone(),
            reason: None,
        };
        assert!(full.validate().is_ok());

        let mut too_many = ids;
        too_many.push(Uuid::new_v4());
        let over = BulkDeactivateRequest {
            activation_ids: too_many,
            reason: None,
        };
        assert!(over.validate().is_err());
    }

    #[test]
    fn test_response_omits_empty_deactivation_fields() {
        let now = Utc::now();
        let activation = Activation {
            id: Uuid::new_v4(),
            license_id: Uuid::new_v4(),
            instance_identifier: "dev-1".into(),
            instance_type: "machine".into(),
            is_active: true,
            activated_at: now,
            deactivated_at: None,
            deactivation_reason: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(ActivationResponse::from(activation)).unwrap();
        assert!(json.get("deactivated_at").is_none());
        assert_eq!(json["is_active"], true);
    }
}
