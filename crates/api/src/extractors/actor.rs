//! Caller label extractor.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use domain::models::license_event::ANONYMOUS_ACTOR;
use std::convert::Infallible;

/// Header carrying the free-form caller label recorded in audit entries.
pub const ACTOR_HEADER: &str = "x-actor";

const MAX_ACTOR_LEN: usize = 255;

/// Caller label taken from `X-Actor`. Not authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reads the actor label from request headers.
///
/// Missing, blank or non-UTF-8 values fall back to `anonymous`; long labels
/// are cut at 255 characters.
pub fn actor_from_headers(headers: &HeaderMap) -> String {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.chars().take(MAX_ACTOR_LEN).collect())
        .unwrap_or_else(|| ANONYMOUS_ACTOR.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Actor(actor_from_headers(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_actor_defaults_to_anonymous() {
        assert_eq!(actor_from_headers(&HeaderMap::new()), "anonymous");
        assert_eq!(actor_from_headers(&headers_with("   ")), "anonymous");
    }

    #[test]
    fn test_actor_is_trimmed() {
        assert_eq!(actor_from_headers(&headers_with("  billing-bot ")), "billing-bot");
    }

    #[test]
    fn test_actor_is_truncated() {
        let long = "a".repeat(400);
        assert_eq!(actor_from_headers(&headers_with(&long)).len(), MAX_ACTOR_LEN);
    }

    #[tokio::test]
    async fn test_extractor_reads_header() {
        let request = axum::http::Request::builder()
            .header(ACTOR_HEADER, "support@acme.test")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let actor = Actor::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(actor.as_str(), "support@acme.test");
    }
}
