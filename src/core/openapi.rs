use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::dashboard::{dtos as dashboard_dtos, handlers as dashboard_handlers};
use crate::features::goals::{
    dtos as goals_dtos, handlers as goals_handlers, models as goals_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::logout,
        auth::handlers::get_me,
        // Dashboard
        dashboard_handlers::get_dashboard,
        // Categories
        categories_handlers::list_categories,
        categories_handlers::get_category,
        categories_handlers::create_category,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        // Goals
        goals_handlers::list_goals,
        goals_handlers::get_goal,
        goals_handlers::create_goal,
        goals_handlers::update_goal,
        goals_handlers::delete_goal,
        goals_handlers::toggle_done,
        goals_handlers::toggle_important,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::model::AuthenticatedUser,
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::AuthUserDto,
            ApiResponse<auth::dtos::AuthUserDto>,
            // Dashboard
            dashboard_dtos::DashboardDto,
            dashboard_dtos::DashboardSummaryDto,
            ApiResponse<dashboard_dtos::DashboardDto>,
            // Categories
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            categories_dtos::CategoryResponseDto,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            // Goals
            goals_models::Timeframe,
            goals_dtos::GoalFormDto,
            goals_dtos::GoalResponseDto,
            ApiResponse<Vec<goals_dtos::GoalResponseDto>>,
            ApiResponse<goals_dtos::GoalResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and sessions"),
        (name = "dashboard", description = "Signed-in overview"),
        (name = "categories", description = "Color-coded goal categories"),
        (name = "goals", description = "Goals with timeframe, done and important flags"),
    ),
    info(
        title = "Goal Tracker API",
        version = "0.1.0",
        description = "API documentation for Goal Tracker",
    )
)]
pub struct ApiDoc;

/// Adds the session cookie security scheme to the OpenAPI spec
pub struct SessionCookieScheme {
    pub cookie_name: String,
}

impl Modify for SessionCookieScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(&self.cookie_name))),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let mut doc = ApiDoc::openapi();
        SessionCookieScheme {
            cookie_name: "sid".to_string(),
        }
        .modify(&mut doc);

        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/logout",
            "/api/auth/me",
            "/api/dashboard",
            "/api/categories",
            "/api/categories/{id}",
            "/api/goals",
            "/api/goals/{id}",
            "/api/goals/{id}/toggle-done",
            "/api/goals/{id}/toggle-important",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {}",
                expected
            );
        }

        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("session_cookie"));
    }
}
