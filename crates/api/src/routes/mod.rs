//! HTTP route handlers.

pub mod activations;
pub mod admin;
pub mod brands;
pub mod health;
pub mod license_keys;
pub mod licenses;
pub mod products;
pub mod service;
