//! Rate limiting middleware.
//!
//! Applies a per-actor quota using keyed GCRA limiters. The actor label is an
//! unauthenticated header, so quotas are scoped to the client address and each
//! address also has a ceiling across every label it sends.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock, QuantaInstant},
    DefaultKeyedRateLimiter, NotUntil, Quota, RateLimiter,
};
use serde_json::json;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::app::AppState;
use crate::extractors::actor_from_headers;

/// How many actor quotas one client address may use in total.
pub const ACTORS_PER_CLIENT: u32 = 10;

/// How often idle limiter entries are dropped.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Rate limiter shared across all requests.
pub struct RateLimiterState {
    actors: DefaultKeyedRateLimiter<(IpAddr, String)>,
    clients: DefaultKeyedRateLimiter<IpAddr>,
    clock: DefaultClock,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    /// Returns `None` when the limit is zero, which disables rate limiting.
    pub fn new(rate_limit_per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        let per_client = NonZeroU32::new(rate_limit_per_minute.saturating_mul(ACTORS_PER_CLIENT))?;
        Some(Self::with_quotas(
            Quota::per_minute(per_minute),
            Quota::per_minute(per_client),
            rate_limit_per_minute,
        ))
    }

    fn with_quotas(actor_quota: Quota, client_quota: Quota, rate_limit_per_minute: u32) -> Self {
        Self {
            actors: RateLimiter::keyed(actor_quota),
            clients: RateLimiter::keyed(client_quota),
            clock: DefaultClock::default(),
            rate_limit_per_minute,
        }
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    /// Returns Ok(()) if allowed, or Err with retry-after seconds if rate limited.
    ///
    /// The actor quota is checked first so a throttled actor does not spend
    /// the client's shared allowance.
    pub fn check(&self, client: IpAddr, actor: &str) -> Result<(), u64> {
        self.actors
            .check_key(&(client, actor.to_string()))
            .map_err(|not_until| self.retry_after(not_until))?;
        self.clients
            .check_key(&client)
            .map_err(|not_until| self.retry_after(not_until))
    }

    fn retry_after(&self, not_until: NotUntil<QuantaInstant>) -> u64 {
        not_until
            .wait_time_from(self.clock.now())
            .as_secs()
            .max(1)
    }

    /// Number of (client, actor) pairs currently tracked.
    pub fn tracked_actors(&self) -> usize {
        self.actors.len()
    }

    /// Drops entries whose quota has fully replenished.
    pub fn prune(&self) {
        self.actors.retain_recent();
        self.actors.shrink_to_fit();
        self.clients.retain_recent();
        self.clients.shrink_to_fit();
    }

    /// Spawns a task that prunes idle entries every `period`.
    pub fn spawn_pruner(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;
                self.prune();
                tracing::debug!(tracked_actors = self.tracked_actors(), "Rate limiter pruned");
            }
        })
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_actors", &self.actors.len())
            .field("tracked_clients", &self.clients.len())
            .finish()
    }
}

/// Peer address of the connection, or the unspecified address when the
/// server was not started with connect info (in-process tests).
fn client_ip(req: &Request<Body>) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware that applies the per-actor quota to API routes.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(rate_limiter) = state.rate_limiter.as_deref() {
        let client = client_ip(&req);
        let actor = actor_from_headers(req.headers());
        if let Err(retry_after) = rate_limiter.check(client, &actor) {
            tracing::warn!(client = %client, actor = %actor, retry_after, "Rate limit exceeded");
            return rate_limited_response(rate_limiter.rate_limit_per_minute(), retry_after);
        }
    }

    next.run(req).await
}

/// Create a rate limited response with proper headers and body.
fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
        "retry_after": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
