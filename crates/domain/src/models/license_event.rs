//! License audit event model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::license::{LicenseStatus, LifecycleOperation};

/// Actor recorded when a request carries no caller label.
pub const ANONYMOUS_ACTOR: &str = "anonymous";

/// Immutable audit entry appended by every lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseEvent {
    pub id: Uuid,
    pub license_id: Uuid,
    pub operation: LifecycleOperation,
    pub actor: String,
    pub from_status: LicenseStatus,
    pub to_status: LicenseStatus,
    pub reason: Option<String>,
    pub details: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

/// Response payload for a license's audit history.
#[derive(Debug, Clone, Serialize)]
pub struct LicenseHistoryResponse {
    pub license_id: Uuid,
    pub events: Vec<LicenseEvent>,
}
