//! Service wiring and the HTTP router, shared by `main` and the API tests.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, http::StatusCode, routing::get, Router};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::core::config::{AppConfig, SessionConfig};
use crate::core::error::Result;
use crate::core::middleware;
use crate::features::auth::password::PasswordHasher;
use crate::features::auth::{routes as auth_routes, AuthService};
use crate::features::categories::{routes as categories_routes, CategoryService};
use crate::features::dashboard::{routes as dashboard_routes, DashboardService};
use crate::features::goals::{routes as goals_routes, GoalService};
use crate::modules::store::Store;

/// Every feature service, built over one store
pub struct Services {
    pub auth: Arc<AuthService>,
    pub categories: Arc<CategoryService>,
    pub goals: Arc<GoalService>,
    pub dashboard: Arc<DashboardService>,
}

impl Services {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: PasswordHasher,
        session: SessionConfig,
    ) -> Result<Self> {
        Ok(Self {
            auth: Arc::new(AuthService::new(Arc::clone(&store), hasher, session)?),
            categories: Arc::new(CategoryService::new(Arc::clone(&store))),
            goals: Arc::new(GoalService::new(Arc::clone(&store))),
            dashboard: Arc::new(DashboardService::new(store)),
        })
    }
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// API routes without the outer layers
pub fn api_routes(services: &Services) -> Router {
    // Protected routes (require a session)
    let protected_routes = Router::new()
        .merge(auth_routes::protected_routes())
        .merge(dashboard_routes::routes(Arc::clone(&services.dashboard)))
        .merge(categories_routes::routes(Arc::clone(&services.categories)))
        .merge(goals_routes::routes(Arc::clone(&services.goals)))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&services.auth),
            middleware::session_middleware,
        ));

    // Public routes (no session required)
    let public_routes = auth_routes::public_routes(Arc::clone(&services.auth));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .route("/health", get(health_check))
}

/// Wrap a router with CORS, body limit, request ids and request tracing
pub fn with_layers(router: Router, config: &AppConfig) -> Router {
    router
        .layer(DefaultBodyLimit::max(config.max_request_body_size))
        .layer(middleware::cors_layer(config.cors_allowed_origins.clone()))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{login, register, test_server};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_health_and_request_id() {
        let (server, _store) = test_server();
        let response = server.get("/health").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_protected_routes_require_session() {
        let (server, _store) = test_server();
        for path in ["/api/auth/me", "/api/dashboard", "/api/categories", "/api/goals"] {
            let response = server.get(path).await;
            assert_eq!(
                response.status_code(),
                StatusCode::UNAUTHORIZED,
                "{} should need a session",
                path
            );
        }
    }

    #[tokio::test]
    async fn test_register_login_logout() {
        let (server, _store) = test_server();

        let response = register(&server, "alice", "pw1").await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let duplicate = register(&server, "alice", "pw1").await;
        assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

        let wrong = server
            .post("/api/auth/login")
            .json(&json!({ "username": "alice", "password": "wrongpw" }))
            .await;
        assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);

        let cookie = login(&server, "alice", "pw1").await;
        assert_eq!(cookie.http_only(), Some(true));

        let me = server.get("/api/auth/me").add_cookie(cookie.clone()).await;
        assert_eq!(me.status_code(), StatusCode::OK);
        assert_eq!(me.json::<Value>()["data"]["username"], "alice");

        let logout = server
            .post("/api/auth/logout")
            .add_cookie(cookie.clone())
            .await;
        assert_eq!(logout.status_code(), StatusCode::OK);

        let after = server.get("/api/auth/me").add_cookie(cookie).await;
        assert_eq!(after.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_mismatched_confirmation() {
        let (server, _store) = test_server();
        let response = server
            .post("/api/auth/register")
            .json(&json!({ "username": "alice", "password": "pw1", "confirmation": "pw2" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["success"], false);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (server, _store) = test_server();
        let response = server
            .post("/api/auth/login")
            .bytes("{not json".into())
            .content_type("application/json")
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_category_and_goal_flow() {
        let (server, _store) = test_server();
        register(&server, "alice", "pw1").await;
        let alice = login(&server, "alice", "pw1").await;

        let created = server
            .post("/api/categories")
            .add_cookie(alice.clone())
            .json(&json!({ "name": "  my   work " }))
            .await;
        assert_eq!(created.status_code(), StatusCode::CREATED);
        let category = created.json::<Value>()["data"].clone();
        assert_eq!(category["name"], "My Work");
        let category_id = category["id"].as_i64().unwrap();

        let dup = server
            .post("/api/categories")
            .add_cookie(alice.clone())
            .json(&json!({ "name": "MY WORK" }))
            .await;
        assert_eq!(dup.status_code(), StatusCode::CONFLICT);

        let goal = server
            .post("/api/goals")
            .add_cookie(alice.clone())
            .json(&json!({
                "name": "ship it",
                "category_id": category_id,
                "timeframe": "Year"
            }))
            .await;
        assert_eq!(goal.status_code(), StatusCode::CREATED);
        let goal = goal.json::<Value>()["data"].clone();
        assert_eq!(goal["timeframe"], "year");
        assert_eq!(goal["done"], false);
        let goal_id = goal["id"].as_i64().unwrap();

        let bad = server
            .post("/api/goals")
            .add_cookie(alice.clone())
            .json(&json!({
                "name": "later",
                "category_id": category_id,
                "timeframe": "decade"
            }))
            .await;
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

        let toggled = server
            .post(&format!("/api/goals/{}/toggle-done", goal_id))
            .add_cookie(alice.clone())
            .await;
        assert_eq!(toggled.status_code(), StatusCode::OK);
        assert_eq!(toggled.json::<Value>()["data"]["done"], true);

        let filtered = server
            .get("/api/goals")
            .add_query_param("timeframe", "month")
            .add_cookie(alice.clone())
            .await;
        assert_eq!(filtered.json::<Value>()["meta"]["total"], 0);

        let blocked = server
            .delete(&format!("/api/categories/{}", category_id))
            .add_cookie(alice.clone())
            .await;
        assert_eq!(blocked.status_code(), StatusCode::CONFLICT);

        let dashboard = server.get("/api/dashboard").add_cookie(alice).await;
        assert_eq!(dashboard.status_code(), StatusCode::OK);
        let dashboard = dashboard.json::<Value>();
        assert_eq!(dashboard["data"]["username"], "alice");
        assert_eq!(dashboard["data"]["summary"]["total_goals"], 1);
        assert_eq!(dashboard["data"]["summary"]["done_goals"], 1);
    }

    #[tokio::test]
    async fn test_length_limits_apply_to_normalized_values() {
        let (server, _store) = test_server();
        register(&server, "alice", "pw1").await;
        let alice = login(&server, "alice", "pw1").await;

        let padded = format!("  {}  ", "a".repeat(100));
        let category = server
            .post("/api/categories")
            .add_cookie(alice.clone())
            .json(&json!({ "name": padded }))
            .await;
        assert_eq!(category.status_code(), StatusCode::CREATED);
        let category = category.json::<Value>()["data"].clone();
        assert_eq!(category["name"].as_str().unwrap().chars().count(), 100);

        let goal = server
            .post("/api/goals")
            .add_cookie(alice.clone())
            .json(&json!({
                "name": format!("   {}   ", "g".repeat(100)),
                "category_id": category["id"],
                "description": format!("   {}   ", "d".repeat(255)),
                "timeframe": "month"
            }))
            .await;
        assert_eq!(goal.status_code(), StatusCode::CREATED);
        let goal = goal.json::<Value>()["data"].clone();
        assert_eq!(goal["description"].as_str().unwrap().chars().count(), 255);

        let too_long = server
            .post("/api/categories")
            .add_cookie(alice)
            .json(&json!({ "name": "b".repeat(101) }))
            .await;
        assert_eq!(too_long.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_of_foreign_goal_is_forbidden_before_validation() {
        let (server, _store) = test_server();
        register(&server, "alice", "pw1").await;
        register(&server, "bob", "pw2").await;
        let alice = login(&server, "alice", "pw1").await;
        let bob = login(&server, "bob", "pw2").await;

        let category = server
            .post("/api/categories")
            .add_cookie(alice.clone())
            .json(&json!({ "name": "Work" }))
            .await
            .json::<Value>();
        let goal = server
            .post("/api/goals")
            .add_cookie(alice)
            .json(&json!({
                "name": "Ship",
                "category_id": category["data"]["id"],
                "timeframe": "month"
            }))
            .await
            .json::<Value>();

        let response = server
            .put(&format!("/api/goals/{}", goal["data"]["id"]))
            .add_cookie(bob)
            .json(&json!({
                "name": "",
                "category_id": category["data"]["id"],
                "timeframe": "month"
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_other_users_goal_is_forbidden() {
        let (server, _store) = test_server();
        register(&server, "alice", "pw1").await;
        register(&server, "bob", "pw2").await;
        let alice = login(&server, "alice", "pw1").await;
        let bob = login(&server, "bob", "pw2").await;

        let category = server
            .post("/api/categories")
            .add_cookie(alice.clone())
            .json(&json!({ "name": "Work" }))
            .await
            .json::<Value>();
        let goal = server
            .post("/api/goals")
            .add_cookie(alice.clone())
            .json(&json!({
                "name": "Ship",
                "category_id": category["data"]["id"],
                "timeframe": "month"
            }))
            .await
            .json::<Value>();
        let goal_path = format!("/api/goals/{}", goal["data"]["id"]);

        let response = server.delete(&goal_path).add_cookie(bob.clone()).await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

        // Bob may still use the same category name
        let bobs = server
            .post("/api/categories")
            .add_cookie(bob)
            .json(&json!({ "name": "Work" }))
            .await;
        assert_eq!(bobs.status_code(), StatusCode::CREATED);

        let still_there = server.get(&goal_path).add_cookie(alice).await;
        assert_eq!(still_there.status_code(), StatusCode::OK);
    }
}
