//! Shared utilities and common types for the license service.
//!
//! This crate provides common functionality used across all other crates:
//! - Page-based pagination parameters and metadata
//! - Common validation logic (slugs, instance identifiers, seat counts)

pub mod pagination;
pub mod validation;
