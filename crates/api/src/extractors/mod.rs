//! Custom Axum extractors.

pub mod actor;
pub mod json;

pub use actor::{actor_from_headers, Actor, ACTOR_HEADER};
pub use json::ValidJson;
