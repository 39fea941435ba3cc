//! Admin statistics model.

use serde::Serialize;

/// License counts keyed by effective status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LicenseStatusCounts {
    pub active: i64,
    pub suspended: i64,
    pub cancelled: i64,
    pub expired: i64,
}

impl LicenseStatusCounts {
    pub fn total(&self) -> i64 {
        self.active + self.suspended + self.cancelled + self.expired
    }
}

/// Service-wide counters shown on the admin dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminStats {
    pub brands: i64,
    pub active_brands: i64,
    pub products: i64,
    pub license_keys: i64,
    pub licenses: LicenseStatusCounts,
    pub active_activations: i64,
}
