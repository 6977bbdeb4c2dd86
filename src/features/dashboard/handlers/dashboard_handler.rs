use std::sync::Arc;

use axum::{extract::State, Json};

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::dashboard::dtos::DashboardDto;
use crate::features::dashboard::services::DashboardService;
use crate::shared::types::ApiResponse;

/// Get the current user's categories, goals and counts
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Dashboard retrieved successfully", body = ApiResponse<DashboardDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "dashboard",
    security(
        ("session_cookie" = [])
    )
)]
pub async fn get_dashboard(
    user: AuthenticatedUser,
    State(service): State<Arc<DashboardService>>,
) -> Result<Json<ApiResponse<DashboardDto>>> {
    let dashboard = service.get(user).await?;
    Ok(Json(ApiResponse::success(Some(dashboard), None, None)))
}
