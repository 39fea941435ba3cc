//! License domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use shared::validation::{validate_future_timestamp, validate_reason};

use super::product::ProductSummary;

// ============================================================================
// License Status Enum
// ============================================================================

/// Lifecycle status of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    Active,
    Suspended,
    Cancelled,
    Expired,
}

impl LicenseStatus {
    pub const ALL: [LicenseStatus; 4] = [
        LicenseStatus::Active,
        LicenseStatus::Suspended,
        LicenseStatus::Cancelled,
        LicenseStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Active => "active",
            LicenseStatus::Suspended => "suspended",
            LicenseStatus::Cancelled => "cancelled",
            LicenseStatus::Expired => "expired",
        }
    }

    /// Whether no lifecycle operation can leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LicenseStatus::Cancelled)
    }

    /// Whether a stored status lapses to `expired` once the expiration date passes.
    pub fn lapses_on_expiry(&self) -> bool {
        matches!(self, LicenseStatus::Active | LicenseStatus::Suspended)
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LicenseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LicenseStatus::Active),
            "suspended" => Ok(LicenseStatus::Suspended),
            "cancelled" => Ok(LicenseStatus::Cancelled),
            "expired" => Ok(LicenseStatus::Expired),
            _ => Err(format!(
                "Invalid license status: {}. Must be one of: active, suspended, cancelled, expired",
                s
            )),
        }
    }
}

/// Lifecycle operations that can be applied to a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleOperation {
    Renew,
    Suspend,
    Resume,
    Cancel,
}

impl LifecycleOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleOperation::Renew => "renew",
            LifecycleOperation::Suspend => "suspend",
            LifecycleOperation::Resume => "resume",
            LifecycleOperation::Cancel => "cancel",
        }
    }

    /// Effective statuses from which this operation is permitted.
    pub fn allowed_from(&self) -> &'static [LicenseStatus] {
        match self {
            LifecycleOperation::Renew => &[LicenseStatus::Active, LicenseStatus::Expired],
            LifecycleOperation::Suspend => &[LicenseStatus::Active],
            LifecycleOperation::Resume => &[LicenseStatus::Suspended],
            LifecycleOperation::Cancel => &[
                LicenseStatus::Active,
                LicenseStatus::Suspended,
                LicenseStatus::Expired,
            ],
        }
    }

    pub fn is_allowed_from(&self, status: LicenseStatus) -> bool {
        self.allowed_from().contains(&status)
    }
}

impl fmt::Display for LifecycleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Core Model
// ============================================================================

/// A license granting access to one product under a license key.
///
/// `status` is the stored status. Expiry is derived at read time, so callers
/// that need the status a client should see use [`License::effective_status_at`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub id: Uuid,
    pub license_key_id: Uuid,
    pub product_id: Uuid,
    pub status: LicenseStatus,
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

impl License {
    /// Whether the expiration date has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiration_date
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Stored status with read-time expiry applied.
    pub fn effective_status_at(&self, now: DateTime<Utc>) -> LicenseStatus {
        if self.status.lapses_on_expiry() && self.is_expired_at(now) {
            LicenseStatus::Expired
        } else {
            self.status
        }
    }

    pub fn effective_status(&self) -> LicenseStatus {
        self.effective_status_at(Utc::now())
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Request payload for issuing a license under an existing key.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLicenseRequest {
    pub license_key_id: Uuid,
    pub product_id: Uuid,
    #[validate(custom(function = "validate_future_timestamp"))]
    pub expiration_date: DateTime<Utc>,
}

/// Request payload for renewing a license.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RenewLicenseRequest {
    pub new_expiration_date: DateTime<Utc>,
    #[validate(length(max = 500, message = "Reason cannot exceed 500 characters"))]
    pub reason: Option<String>,
}

/// Request payload for suspending a license.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SuspendLicenseRequest {
    #[validate(length(max = 500, message = "Reason cannot exceed 500 characters"))]
    #[validate(custom(function = "validate_reason"))]
    pub reason: String,
}

/// Request payload for cancelling a license.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CancelLicenseRequest {
    #[validate(length(max = 500, message = "Reason cannot exceed 500 characters"))]
    #[validate(custom(function = "validate_reason"))]
    pub reason: String,
}

/// Query parameters for listing licenses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListLicensesQuery {
    /// Filters on the effective status.
    pub status: Option<LicenseStatus>,
    pub product_id: Option<Uuid>,
    pub license_key_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub customer_email: Option<String>,
}

// ============================================================================
// Response DTOs
// ============================================================================

/// License representation returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct LicenseResponse {
    pub id: Uuid,
    pub license_key_id: Uuid,
    pub license_key: Uuid,
    pub customer_email: String,
    pub product: ProductSummary,
    pub status: LicenseStatus,
    pub total_seats: i32,
    pub active_seats: i64,
    pub available_seats: i64,
    pub expiration_date: DateTime<Utc>,
    pub is_expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_expiration_date: Option<DateTime<Utc>>,
    pub renewal_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspension_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
