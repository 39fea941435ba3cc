//! Seat ledger rules.
//!
//! These functions decide; the persistence layer counts and writes inside a
//! transaction that holds the license row lock, so the decision and the
//! write observe the same seat count.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{Activation, License, LicenseKey, LicenseStatus};

/// Seat usage of one license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeatUsage {
    pub total: i32,
    pub used: i64,
}

impl SeatUsage {
    pub fn new(total: i32, used: i64) -> Self {
        Self { total, used }
    }

    /// Seats still free, floored at zero.
    pub fn available(&self) -> i64 {
        (i64::from(self.total) - self.used).max(0)
    }

    pub fn has_capacity(&self) -> bool {
        self.available() > 0
    }
}

/// What an accepted activation should do to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationPlan {
    /// Insert a new activation row.
    Create,
    /// Flip an existing inactive row for the same instance back on.
    Reactivate { activation_id: Uuid },
}

/// Decides whether `instance` may claim a seat on `license`.
///
/// `existing` is the activation row for the same license and instance, if
/// any. Checks run in a fixed order: blank instance, duplicate, capacity,
/// then license and key state.
pub fn plan_activation(
    license: &License,
    key: &LicenseKey,
    usage: SeatUsage,
    existing: Option<&Activation>,
    instance: &str,
    now: DateTime<Utc>,
) -> Result<ActivationPlan, DomainError> {
    if instance.trim().is_empty() {
        return Err(DomainError::validation("Instance identifier cannot be blank"));
    }

    if let Some(activation) = existing.filter(|a| a.is_active) {
        return Err(DomainError::DuplicateActivation {
            instance: activation.instance_identifier.clone(),
        });
    }

    if !usage.has_capacity() {
        return Err(DomainError::SeatLimitExceeded {
            total: usage.total,
            used: usage.used,
        });
    }

    let status = license.effective_status_at(now);
    if status != LicenseStatus::Active {
        return Err(DomainError::LicenseNotActive { status });
    }
    if !key.is_active {
        return Err(DomainError::LicenseKeyInactive);
    }

    Ok(match existing {
        Some(activation) => ActivationPlan::Reactivate {
            activation_id: activation.id,
        },
        None => ActivationPlan::Create,
    })
}

/// Releases the seat held by `activation`.
pub fn deactivate(
    activation: &mut Activation,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    if !activation.is_active {
        return Err(DomainError::AlreadyInactive);
    }
    activation.is_active = false;
    activation.deactivated_at = Some(now);
    activation.deactivation_reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    activation.updated_at = now;
    Ok(())
}

/// Checks that a key's seat total can be set to `new_total`.
///
/// `max_active` is the largest active activation count of any license under
/// the key.
pub fn check_seat_override(new_total: i32, max_active: i64) -> Result<(), DomainError> {
    if new_total < 0 {
        return Err(DomainError::validation("Total seats must be zero or greater"));
    }
    if i64::from(new_total) < max_active {
        return Err(DomainError::validation(format!(
            "Total seats cannot be lower than the {} active activations already in use",
            max_active
        )));
    }
    Ok(())
}

/// Outcome of one id in a bulk deactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkItemStatus {
    Deactivated,
    AlreadyInactive,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkItemResult {
    pub activation_id: Uuid,
    pub status: BulkItemStatus,
}

/// Per-item report of a bulk deactivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkDeactivateReport {
    pub deactivated_count: usize,
    pub results: Vec<BulkItemResult>,
}

impl BulkDeactivateReport {
    pub fn push(&mut self, activation_id: Uuid, status: BulkItemStatus) {
        if status == BulkItemStatus::Deactivated {
            self.deactivated_count += 1;
        }
        self.results.push(BulkItemResult {
            activation_id,
            status,
        });
    }

    pub fn count(&self, status: BulkItemStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}
