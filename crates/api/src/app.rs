use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, security_headers_middleware,
    trace_id, RateLimiterState,
};
use crate::routes::{
    activations, admin, brands, health, license_keys, licenses, products, service,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        // Development default: any origin
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let rate_limiter =
            RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);
        Self {
            pool,
            config: Arc::new(config),
            rate_limiter,
        }
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    create_router(AppState::new(config, pool))
}

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let registry_routes = Router::new()
        .route(
            "/api/v1/brands",
            get(brands::list_brands).post(brands::create_brand),
        )
        .route(
            "/api/v1/brands/:brand_id",
            get(brands::get_brand).patch(brands::update_brand),
        )
        .route(
            "/api/v1/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/v1/products/:product_id",
            get(products::get_product).patch(products::update_product),
        )
        .route(
            "/api/v1/license-keys",
            get(license_keys::list_license_keys).post(license_keys::create_license_key),
        )
        .route(
            "/api/v1/license-keys/by-email",
            get(license_keys::license_keys_by_email),
        )
        .route(
            "/api/v1/license-keys/:license_key_id",
            get(license_keys::get_license_key).patch(license_keys::update_license_key),
        )
        .route(
            "/api/v1/license-keys/:license_key_id/seats",
            put(license_keys::override_seats),
        );

    let license_routes = Router::new()
        .route(
            "/api/v1/licenses",
            get(licenses::list_licenses).post(licenses::create_license),
        )
        .route("/api/v1/licenses/:license_id", get(licenses::get_license))
        .route(
            "/api/v1/licenses/:license_id/renew",
            post(licenses::renew_license),
        )
        .route(
            "/api/v1/licenses/:license_id/suspend",
            post(licenses::suspend_license),
        )
        .route(
            "/api/v1/licenses/:license_id/resume",
            post(licenses::resume_license),
        )
        .route(
            "/api/v1/licenses/:license_id/cancel",
            post(licenses::cancel_license),
        )
        .route(
            "/api/v1/licenses/:license_id/history",
            get(licenses::license_history),
        )
        .route(
            "/api/v1/licenses/:license_id/activations",
            get(licenses::list_license_activations).post(licenses::activate_license),
        )
        .route("/api/v1/activations", get(activations::list_activations))
        .route(
            "/api/v1/activations/bulk_deactivate",
            post(activations::bulk_deactivate),
        )
        .route(
            "/api/v1/activations/:activation_id",
            get(activations::get_activation),
        )
        .route(
            "/api/v1/activations/:activation_id/deactivate",
            post(activations::deactivate_activation),
        );

    let service_routes = Router::new()
        .route("/api/v1/service/check-status", post(service::check_status))
        .route("/api/v1/service/activate", post(service::activate))
        .route("/api/v1/service/provision", post(service::provision))
        .route("/api/v1/admin/stats", get(admin::stats));

    // Versioned API, throttled per actor
    let api_routes = Router::new()
        .merge(registry_routes)
        .merge(license_routes)
        .merge(service_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn test_app(overrides: &[(&str, &str)]) -> Router {
        let mut all = vec![("database.url", "postgres://localhost:1/unreachable")];
        all.extend_from_slice(overrides);
        let config = Config::load_for_test(&all).unwrap();
        // Never connects; handlers below do not touch the database.
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(100))
            .connect_lazy(&config.database.url)
            .unwrap();
        create_app(config, pool)
    }

    #[tokio::test]
    async fn test_live_probe_has_request_id_and_security_headers() {
        let response = test_app(&[])
            .oneshot(
                Request::builder()
                    .uri("/api/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = test_app(&[])
            .oneshot(
                Request::builder()
                    .uri("/api/v1/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_path_id_is_rejected() {
        let response = test_app(&[])
            .oneshot(
                Request::builder()
                    .uri("/api/v1/licenses/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected_before_database() {
        let response = test_app(&[])
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/brands")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rate_limit_applies_per_actor() {
        let app = test_app(&[("security.rate_limit_per_minute", "1")]);
        let request = |actor: &str| {
            Request::builder()
                .method("POST")
                .uri("/api/v1/brands")
                .header("x-actor", actor)
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap()
        };

        let first = app.clone().oneshot(request("ops")).await.unwrap();
        assert_ne!(first.status(), StatusCode::TOO_MANY_REQUESTS);

        let second = app.clone().oneshot(request("ops")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key("retry-after"));

        let other = app.oneshot(request("billing")).await.unwrap();
        assert_ne!(other.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_rotating_actor_header_is_capped_per_client() {
        use crate::middleware::rate_limit::ACTORS_PER_CLIENT;

        let app = test_app(&[("security.rate_limit_per_minute", "1")]);
        let mut throttled = 0;
        for i in 0..=ACTORS_PER_CLIENT {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/v1/brands")
                        .header("x-actor", format!("rotating-{}", i))
                        .header("content-type", "application/json")
                        .body(Body::from("{}"))
                        .unwrap(),
                )
                .await
                .unwrap();
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                throttled += 1;
            }
        }
        assert_eq!(throttled, 1);
    }
}
