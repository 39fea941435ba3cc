//! Transactional license operations.
//!
//! Each service method runs one database transaction: it locks the rows it
//! depends on, applies the domain rules and persists the outcome.

pub mod entitlements;
pub mod lifecycle;
pub mod provisioning;
pub mod seats;

use domain::DomainError;
use thiserror::Error;

pub use entitlements::EntitlementService;
pub use lifecycle::LifecycleService;
pub use provisioning::ProvisioningService;
pub use seats::SeatService;

/// Errors raised by the license services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
