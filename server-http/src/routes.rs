use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method, StatusCode},
    routing::get,
    Router,
};
use shared::config::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Build and configure the application router
pub fn build_router(state: AppState, config: &Config) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Read-through cache endpoint
        .route("/api/cache", get(handlers::get_cached_value))
        // Middleware
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods([Method::GET]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use cache_aside::{CacheGateway, CacheStoreClient, ValueSource};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use storage_engine::MokaStore;
    use tower::ServiceExt;

    struct FixedValue;

    impl ValueSource for FixedValue {
        fn compute(&self) -> String {
            "2024-01-01T00:00:00Z".to_string()
        }
    }

    struct UnreachableStore;

    /// Store whose reads hang well past any test timeout
    struct SlowStore;

    #[async_trait]
    impl CacheStoreClient for SlowStore {
        async fn get(&self, _key: &str) -> shared::Result<Option<String>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> shared::Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl CacheStoreClient for UnreachableStore {
        async fn get(&self, _key: &str) -> shared::Result<Option<String>> {
            Err(shared::Error::StoreUnavailable("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> shared::Result<()> {
            Err(shared::Error::StoreUnavailable("connection refused".into()))
        }
    }

    fn config_with(name: &'static str, value: &'static str) -> Config {
        Config::from_lookup(|var| (var == name).then(|| value.to_string())).unwrap()
    }

    fn router_with_config(store: Arc<dyn CacheStoreClient>, key: &str, config: &Config) -> Router {
        let gateway =
            CacheGateway::with_value_source(store, Arc::new(FixedValue), CacheGateway::DEFAULT_TTL);
        build_router(AppState::new(gateway, key), config)
    }

    fn router_with(store: Arc<dyn CacheStoreClient>, key: &str) -> Router {
        router_with_config(store, key, &Config::from_lookup(|_| None).unwrap())
    }

    async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let router = router_with(Arc::new(MokaStore::new_unbounded()), "myCacheKey");

        let (status, body) = get_json(&router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "OK" }));
    }

    #[tokio::test]
    async fn test_cache_miss_then_hit() {
        let router = router_with(Arc::new(MokaStore::new_unbounded()), "k1");

        let (status, body) = get_json(&router, "/api/cache").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "cached": false, "value": "2024-01-01T00:00:00Z" }));

        let (status, body) = get_json(&router, "/api/cache").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "cached": true, "value": "2024-01-01T00:00:00Z" }));
    }

    #[tokio::test]
    async fn test_store_failure_is_server_error() {
        let router = router_with(Arc::new(UnreachableStore), "k1");

        let (status, body) = get_json(&router, "/api/cache").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_empty_key_is_bad_request() {
        let router = router_with(Arc::new(MokaStore::new_unbounded()), "");

        let (status, _) = get_json(&router, "/api/cache").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_only_get_is_routed() {
        let router = router_with(Arc::new(MokaStore::new_unbounded()), "k1");

        let response = router
            .oneshot(Request::post("/api/cache").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let config = config_with("CACHE_REQUEST_TIMEOUT_MS", "50");
        let router = router_with_config(Arc::new(SlowStore), "k1", &config);

        let response = router
            .oneshot(Request::get("/api/cache").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    async fn allowed_origin(router: &Router, origin: &str) -> Option<HeaderValue> {
        let request = Request::get("/health")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .cloned()
    }

    #[tokio::test]
    async fn test_cors_allows_only_configured_origins() {
        // The second origin is not a valid header value and gets skipped
        let config = config_with("CACHE_ALLOWED_ORIGINS", "http://a.test, http://bad\u{7f}.test");
        let router = router_with_config(Arc::new(MokaStore::new_unbounded()), "k1", &config);

        assert_eq!(
            allowed_origin(&router, "http://a.test").await,
            Some(HeaderValue::from_static("http://a.test"))
        );
        assert_eq!(allowed_origin(&router, "http://b.test").await, None);
    }

    #[tokio::test]
    async fn test_cors_wildcard_allows_any_origin() {
        let router = router_with(Arc::new(MokaStore::new_unbounded()), "k1");

        assert_eq!(
            allowed_origin(&router, "http://b.test").await,
            Some(HeaderValue::from_static("*"))
        );
    }
}
