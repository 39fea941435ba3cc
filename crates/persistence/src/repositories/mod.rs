//! Repository implementations for database operations.

pub mod activation;
pub mod brand;
pub mod license;
pub mod license_event;
pub mod license_key;
pub mod product;
pub mod stats;

pub use activation::{ActivationFilter, ActivationRepository};
pub use brand::BrandRepository;
pub use license::{LicenseFilter, LicenseRepository};
pub use license_event::LicenseEventRepository;
pub use license_key::{LicenseKeyFilter, LicenseKeyRepository};
pub use product::ProductRepository;
pub use stats::{RegistryCountsEntity, StatsRepository};
