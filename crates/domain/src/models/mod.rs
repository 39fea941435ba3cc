//! Domain models for the License Service.

pub mod activation;
pub mod admin;
pub mod brand;
pub mod license;
pub mod license_event;
pub mod license_key;
pub mod product;
pub mod service;

pub use activation::Activation;
pub use admin::{AdminStats, LicenseStatusCounts};
pub use brand::Brand;
pub use license::{License, LicenseStatus, LifecycleOperation};
pub use license_event::LicenseEvent;
pub use license_key::LicenseKey;
pub use product::Product;
