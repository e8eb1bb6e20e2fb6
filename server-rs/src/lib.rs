use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use http::HeaderValue;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use config::Config;
use services::boosts::BoostService;
use services::clock::{Clock, SystemClock};
use services::entitlements::EntitlementService;
use services::likes::LikeService;
use store::{BoostStore, LikeStore, UsageStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub entitlements: Arc<EntitlementService>,
    pub boosts: Arc<BoostService>,
    pub likes: Arc<LikeService>,
}

impl AppState {
    pub fn new<S>(config: Config, store: Arc<S>) -> Self
    where
        S: UsageStore + BoostStore + LikeStore + 'static,
    {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    pub fn with_clock<S>(config: Config, store: Arc<S>, clock: Arc<dyn Clock>) -> Self
    where
        S: UsageStore + BoostStore + LikeStore + 'static,
    {
        let entitlements = Arc::new(EntitlementService::new(store.clone(), clock));
        let boosts = Arc::new(BoostService::new(entitlements.clone(), store.clone()));
        let likes = Arc::new(LikeService::new(entitlements.clone(), store));
        Self {
            config: Arc::new(config),
            entitlements,
            boosts,
            likes,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.is_production() && !origins.is_empty() {
        cors.allow_origin(AllowOrigin::list(origins))
    } else {
        cors.allow_origin(Any)
    }
}

pub fn build_router(state: AppState) -> Router {
    let limit_routes = Router::new()
        .route("/", get(routes::limits::summary))
        .route("/:action", get(routes::limits::check))
        .route("/:action/record", post(routes::limits::record));

    let feature_routes = Router::new().route("/:feature", get(routes::limits::feature));

    let boost_routes = Router::new()
        .route("/", post(routes::boosts::activate))
        .route(
            "/active",
            get(routes::boosts::active).delete(routes::boosts::end),
        );

    let like_routes = Router::new()
        .route("/:target", post(routes::likes::like))
        .route("/:target/super", post(routes::likes::super_like));

    let api = Router::new()
        .nest("/limits", limit_routes)
        .nest("/likes", like_routes)
        .nest("/features", feature_routes)
        .nest("/boosts", boost_routes)
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(routes::health::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::test_token;
    use crate::models::ProfileUsage;
    use crate::store::memory::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn app_with(tier: &str, likes_used: i32) -> (Router, Arc<MemoryStore>, String, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        store
            .insert_profile(ProfileUsage {
                id: user,
                subscription_tier: Some(tier.to_string()),
                role: None,
                daily_likes_used: Some(likes_used),
                daily_super_likes_used: Some(0),
                daily_boosts_used: Some(0),
                last_like_reset_date: Some(chrono::Utc::now()),
            })
            .await;
        let config = Config::for_tests();
        let token = test_token(user, &config.jwt);
        let state = AppState::new(config, store.clone());
        (build_router(state), store, token, user)
    }

    async fn call(app: Router, method: &str, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {token}"));
        }
        let res = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn requests_without_token_are_rejected() {
        let (app, _, _, _) = app_with("registered", 0).await;
        let (status, _) = call(app, "GET", "/api/v1/limits", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn summary_reports_all_three_counters() {
        let (app, _, token, _) = app_with("gold", 40).await;
        let (status, body) = call(app, "GET", "/api/v1/limits", Some(&token)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tier"], "gold");
        assert_eq!(body["likes"]["remaining"], 60);
        assert_eq!(body["superLikes"]["remaining"], 10);
        assert_eq!(body["boosts"]["remaining"], 3);
        assert_eq!(body["recommendedUpgrade"], "platinum");
    }

    #[tokio::test]
    async fn unlimited_is_reported_as_a_string() {
        let (app, _, token, _) = app_with("platinum", 500).await;
        let (status, body) = call(app, "GET", "/api/v1/limits/like", Some(&token)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allowed"], true);
        assert_eq!(body["remaining"], "unlimited");
    }

    #[tokio::test]
    async fn recording_past_the_cap_is_forbidden() {
        let (app, store, token, user) = app_with("registered", 10).await;
        let (status, body) = call(app, "POST", "/api/v1/limits/like/record", Some(&token)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "quota_exceeded");
        assert_eq!(body["suggestedTier"], "silver");
        assert_eq!(store.profile(user).await.unwrap().daily_likes_used, Some(10));
    }

    #[tokio::test]
    async fn failed_write_is_retryable() {
        let (app, store, token, _) = app_with("silver", 1).await;
        store.fail_next_updates(1);
        let (status, body) = call(app, "POST", "/api/v1/limits/superlike/record", Some(&token)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn unknown_action_is_a_bad_request() {
        let (app, _, token, _) = app_with("silver", 0).await;
        let (status, _) = call(app, "GET", "/api/v1/limits/wink", Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn feature_access_is_reported() {
        let (app, _, token, _) = app_with("silver", 0).await;
        let (status, body) = call(app, "GET", "/api/v1/features/passport", Some(&token)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allowed"], false);
        assert_eq!(body["requiredTier"], "gold");
    }

    #[tokio::test]
    async fn boost_lifecycle_over_http() {
        let (app, _, token, _) = app_with("gold", 0).await;

        let (status, body) = call(app.clone(), "POST", "/api/v1/boosts", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["durationMinutes"], 60);
        assert_eq!(body["remainingBoosts"], 2);

        let (status, _) = call(app.clone(), "POST", "/api/v1/boosts", Some(&token)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = call(app.clone(), "DELETE", "/api/v1/boosts/active", Some(&token)).await;
        assert_eq!(body["ended"], true);

        let (_, body) = call(app, "GET", "/api/v1/boosts/active", Some(&token)).await;
        assert!(body["boost"].is_null());
    }

    #[tokio::test]
    async fn like_then_super_like_over_http() {
        let (app, store, token, user) = app_with("silver", 49).await;
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        store.insert_swipe(second, user, "right").await;

        let (status, body) = call(app.clone(), "POST", &format!("/api/v1/likes/{first}"), Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isMatch"], false);
        assert_eq!(body["remaining"], 0);

        let (status, body) = call(app.clone(), "POST", &format!("/api/v1/likes/{second}"), Some(&token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["suggestedTier"], "gold");

        let (status, body) = call(app, "POST", &format!("/api/v1/likes/{second}/super"), Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["superLike"], true);
        assert_eq!(body["isMatch"], true);
        assert_eq!(body["remaining"], 4);

        let row = store.profile(user).await.unwrap();
        assert_eq!(row.daily_likes_used, Some(50));
        assert_eq!(row.daily_super_likes_used, Some(1));
    }

    #[tokio::test]
    async fn like_with_failed_counter_write_is_retryable() {
        let (app, store, token, user) = app_with("registered", 2).await;
        store.fail_next_updates(1);

        let target = Uuid::new_v4();
        let (status, body) = call(app, "POST", &format!("/api/v1/likes/{target}"), Some(&token)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["retryable"], true);
        assert_eq!(store.profile(user).await.unwrap().daily_likes_used, Some(2));
    }

    #[tokio::test]
    async fn like_target_must_be_a_uuid() {
        let (app, _, token, _) = app_with("silver", 0).await;
        let (status, _) = call(app, "POST", "/api/v1/likes/someone", Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_store() {
        let (app, _, _, _) = app_with("registered", 0).await;
        let (status, body) = call(app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
