use std::sync::Arc;

use axum_extra::extract::cookie::Cookie;
use axum_test::{TestResponse, TestServer};
use chrono::Utc;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use serde_json::json;

use crate::core::config::{AppConfig, PasswordConfig, SessionConfig};
use crate::core::router::{api_routes, with_layers, Services};
use crate::features::auth::models::{NewUser, Session, User};
use crate::features::auth::password::PasswordHasher;
use crate::features::auth::session::generate_token;
use crate::features::auth::AuthService;
use crate::modules::store::{MemoryStore, Store};

pub fn fast_hasher() -> PasswordHasher {
    PasswordHasher::new(&PasswordConfig::fast_for_tests()).expect("valid argon2 params")
}

pub fn test_auth_service(store: Arc<dyn Store>) -> AuthService {
    AuthService::new(store, fast_hasher(), SessionConfig::default()).expect("auth service")
}

/// Insert a user directly, bypassing password hashing
pub async fn seed_user(store: &dyn Store, username: &str) -> User {
    store
        .create_user(NewUser {
            username: username.to_string(),
            password_hash: "unused".to_string(),
        })
        .await
        .expect("seed user")
}

/// Insert a user with a live session and return the session token
pub async fn seed_session(store: &dyn Store, username: &str) -> String {
    let user = seed_user(store, username).await;
    let now = Utc::now();
    let session = store
        .create_session(Session {
            token: generate_token(),
            user_id: user.id,
            created_at: now,
            expires_at: now + chrono::Duration::hours(1),
        })
        .await
        .expect("seed session");
    session.token
}

/// Short lorem sentence that fits a goal description
pub fn fake_description() -> String {
    Sentence(3..8).fake()
}

/// The full router over a fresh `MemoryStore`
pub fn test_server() -> (TestServer, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let services = Services::new(store.clone(), fast_hasher(), SessionConfig::default())
        .expect("services");
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_allowed_origins: vec!["*".to_string()],
        max_request_body_size: 1024 * 1024,
    };

    let app = with_layers(api_routes(&services), &config);
    (TestServer::new(app).expect("test server"), store)
}

pub async fn register(server: &TestServer, username: &str, password: &str) -> TestResponse {
    server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "password": password,
            "confirmation": password,
        }))
        .await
}

/// Log in and return the session cookie
pub async fn login(server: &TestServer, username: &str, password: &str) -> Cookie<'static> {
    server
        .post("/api/auth/login")
        .json(&json!({ "username": username, "password": password }))
        .await
        .cookie(&SessionConfig::default().cookie_name)
}
