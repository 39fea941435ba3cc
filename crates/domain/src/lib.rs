//! Domain layer for the license service.
//!
//! This crate contains:
//! - Domain models (Brand, Product, LicenseKey, License, Activation)
//! - The license lifecycle state machine and seat ledger rules
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::DomainError;
