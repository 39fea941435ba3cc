//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod activation;
pub mod brand;
pub mod license;
pub mod license_event;
pub mod license_key;
pub mod product;

pub use activation::ActivationEntity;
pub use brand::{BrandEntity, BrandWithCountEntity};
pub use license::{LicenseDetailEntity, LicenseEntity, LicenseStatusDb};
pub use license_event::{LicenseEventEntity, LicenseOperationDb};
pub use license_key::{LicenseKeyEntity, LicenseKeySummaryEntity};
pub use product::{ProductEntity, ProductWithBrandEntity};
