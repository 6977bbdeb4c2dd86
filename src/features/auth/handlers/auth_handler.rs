use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{AuthUserDto, LoginRequestDto, RegisterRequestDto};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::AuthService;
use crate::features::auth::session::token_from_jar;
use crate::shared::types::ApiResponse;
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use validator::Validate;

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<AuthUserDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Username already exists")
    ),
    tag = "auth"
)]
pub async fn register(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<AuthUserDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service.register(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(user),
            Some("Registration successful, you can now log in".to_string()),
            None,
        )),
    ))
}

/// Login with username and password
///
/// On success the session token is set as an HTTP-only cookie.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthUserDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    jar: CookieJar,
    AppJson(dto): AppJson<LoginRequestDto>,
) -> Result<(CookieJar, Json<ApiResponse<AuthUserDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (session, user) = service.login(dto).await?;

    // Replace any session the client is still carrying
    let previous = token_from_jar(&jar, service.session_config());
    if let Err(e) = service.logout(previous.as_deref()).await {
        tracing::warn!("Failed to delete previous session on login: {}", e);
    }

    let jar = jar.add(service.session_cookie(session.token));
    Ok((
        jar,
        Json(ApiResponse::success(
            Some(user),
            Some("Logged in successfully".to_string()),
            None,
        )),
    ))
}

/// Logout and clear the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out")
    ),
    tag = "auth"
)]
pub async fn logout(
    State(service): State<Arc<AuthService>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<()>>)> {
    let token = token_from_jar(&jar, service.session_config());
    service.logout(token.as_deref()).await?;

    let jar = jar.remove(service.removal_cookie());
    Ok((
        jar,
        Json(ApiResponse::success(
            None,
            Some("You have been logged out".to_string()),
            None,
        )),
    ))
}

/// Get current authenticated user info
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user retrieved successfully", body = ApiResponse<AuthUserDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(
        ("session_cookie" = [])
    )
)]
pub async fn get_me(user: AuthenticatedUser) -> Result<Json<ApiResponse<AuthUserDto>>> {
    Ok(Json(ApiResponse::success(Some(user.into()), None, None)))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum_test::TestServer;
    use chrono::{DateTime, Utc};
    use serde_json::Value;

    use super::*;
    use crate::core::config::SessionConfig;
    use crate::core::router::{api_routes, Services};
    use crate::features::auth::models::{NewUser, Session, User};
    use crate::features::categories::models::{Category, NewCategory};
    use crate::features::goals::models::{Goal, NewGoal, Timeframe};
    use crate::modules::store::{GoalFilter, MemoryStore, Store};
    use crate::shared::test_helpers::{fast_hasher, login, register};

    /// `MemoryStore` whose session deletes always fail
    struct StuckSessions(MemoryStore);

    #[async_trait]
    impl Store for StuckSessions {
        async fn create_user(&self, user: NewUser) -> Result<User> {
            self.0.create_user(user).await
        }
        async fn get_user(&self, id: i64) -> Result<Option<User>> {
            self.0.get_user(id).await
        }
        async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
            self.0.get_user_by_username(username).await
        }
        async fn create_session(&self, session: Session) -> Result<Session> {
            self.0.create_session(session).await
        }
        async fn get_session(&self, token: &str) -> Result<Option<Session>> {
            self.0.get_session(token).await
        }
        async fn delete_session(&self, _token: &str) -> Result<()> {
            Err(AppError::Internal("session table unavailable".to_string()))
        }
        async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
            self.0.delete_expired_sessions(now).await
        }
        async fn create_category(&self, category: NewCategory) -> Result<Category> {
            self.0.create_category(category).await
        }
        async fn get_category(&self, id: i64) -> Result<Option<Category>> {
            self.0.get_category(id).await
        }
        async fn find_category_by_name(
            &self,
            user_id: i64,
            name: &str,
        ) -> Result<Option<Category>> {
            self.0.find_category_by_name(user_id, name).await
        }
        async fn find_category_by_color(
            &self,
            user_id: i64,
            color: &str,
        ) -> Result<Option<Category>> {
            self.0.find_category_by_color(user_id, color).await
        }
        async fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
            self.0.list_categories(user_id).await
        }
        async fn update_category(&self, category: Category) -> Result<Category> {
            self.0.update_category(category).await
        }
        async fn delete_category(&self, id: i64) -> Result<()> {
            self.0.delete_category(id).await
        }
        async fn create_goal(&self, goal: NewGoal) -> Result<Goal> {
            self.0.create_goal(goal).await
        }
        async fn get_goal(&self, id: i64) -> Result<Option<Goal>> {
            self.0.get_goal(id).await
        }
        async fn find_goal_by_name(
            &self,
            user_id: i64,
            category_id: i64,
            timeframe: Timeframe,
            name: &str,
        ) -> Result<Option<Goal>> {
            self.0
                .find_goal_by_name(user_id, category_id, timeframe, name)
                .await
        }
        async fn list_goals(&self, user_id: i64, filter: GoalFilter) -> Result<Vec<Goal>> {
            self.0.list_goals(user_id, filter).await
        }
        async fn count_goals_in_category(&self, category_id: i64) -> Result<i64> {
            self.0.count_goals_in_category(category_id).await
        }
        async fn update_goal(&self, goal: Goal) -> Result<Goal> {
            self.0.update_goal(goal).await
        }
        async fn delete_goal(&self, id: i64) -> Result<()> {
            self.0.delete_goal(id).await
        }
    }

    #[tokio::test]
    async fn test_login_survives_failed_cleanup_of_previous_session() {
        let store = Arc::new(StuckSessions(MemoryStore::new()));
        let services =
            Services::new(store, fast_hasher(), SessionConfig::default()).expect("services");
        let server = TestServer::new(api_routes(&services)).expect("test server");

        register(&server, "alice", "pw1").await;
        let first = login(&server, "alice", "pw1").await;

        let response = server
            .post("/api/auth/login")
            .add_cookie(first)
            .json(&serde_json::json!({ "username": "alice", "password": "pw1" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let second = response.cookie(&SessionConfig::default().cookie_name);
        let me = server.get("/api/auth/me").add_cookie(second).await;
        assert_eq!(me.status_code(), StatusCode::OK);
        assert_eq!(me.json::<Value>()["data"]["username"], "alice");
    }
}
