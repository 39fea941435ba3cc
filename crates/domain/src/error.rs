//! Domain error types.

use thiserror::Error;

use crate::models::{LicenseStatus, LifecycleOperation};

/// Errors raised by lifecycle and seat ledger rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The requested lifecycle operation is not permitted from the current status.
    #[error("Cannot {operation} license with status {from}")]
    InvalidTransition {
        from: LicenseStatus,
        operation: LifecycleOperation,
    },

    /// Every seat on the license is held by an active activation.
    #[error("No available seats: {used} of {total} in use")]
    SeatLimitExceeded { total: i32, used: i64 },

    /// The instance already holds an active seat on the license.
    #[error("Instance '{instance}' already has an active activation for this license")]
    DuplicateActivation { instance: String },

    #[error("Activation is already deactivated")]
    AlreadyInactive,

    /// Seats can only be claimed on a license whose effective status is active.
    #[error("License is not active (status: {status})")]
    LicenseNotActive { status: LicenseStatus },

    #[error("License key is inactive")]
    LicenseKeyInactive,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),
}

impl DomainError {
    /// Machine-readable error kind, used as the `error` field of API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::InvalidTransition { .. } => "invalid_transition",
            DomainError::SeatLimitExceeded { .. } => "seat_limit_exceeded",
            DomainError::DuplicateActivation { .. } => "duplicate_activation",
            DomainError::AlreadyInactive => "already_inactive",
            DomainError::LicenseNotActive { .. } => "license_not_active",
            DomainError::LicenseKeyInactive => "license_key_inactive",
            DomainError::NotFound(_) => "not_found",
            DomainError::Validation(_) => "validation_error",
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        DomainError::NotFound(resource.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = DomainError::InvalidTransition {
            from: LicenseStatus::Cancelled,
            operation: LifecycleOperation::Renew,
        };
        assert_eq!(err.to_string(), "Cannot renew license with status cancelled");
        assert_eq!(err.kind(), "invalid_transition");
    }

    #[test]
    fn test_seat_limit_message() {
        let err = DomainError::SeatLimitExceeded { total: 2, used: 2 };
        assert_eq!(err.to_string(), "No available seats: 2 of 2 in use");
        assert_eq!(err.kind(), "seat_limit_exceeded");
    }

    #[test]
    fn test_kinds_are_distinct() {
        let errors = [
            DomainError::InvalidTransition {
                from: LicenseStatus::Active,
                operation: LifecycleOperation::Resume,
            },
            DomainError::SeatLimitExceeded { total: 0, used: 0 },
            DomainError::DuplicateActivation {
                instance: "dev-1".into(),
            },
            DomainError::AlreadyInactive,
            DomainError::LicenseNotActive {
                status: LicenseStatus::Suspended,
            },
            DomainError::LicenseKeyInactive,
            DomainError::not_found("License"),
            DomainError::validation("bad"),
        ];
        let mut kinds: Vec<_> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            DomainError::not_found("Activation").to_string(),
            "Activation not found"
        );
    }
}
