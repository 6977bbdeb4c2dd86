use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::goals::dtos::{GoalFormDto, GoalQueryParams, GoalResponseDto};
use crate::features::goals::services::GoalService;
use crate::shared::types::{ApiResponse, Meta};

/// List the current user's goals
#[utoipa::path(
    get,
    path = "/api/goals",
    params(GoalQueryParams),
    responses(
        (status = 200, description = "List of goals", body = ApiResponse<Vec<GoalResponseDto>>),
        (status = 400, description = "Invalid timeframe filter"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "goals",
    security(
        ("session_cookie" = [])
    )
)]
pub async fn list_goals(
    user: AuthenticatedUser,
    State(service): State<Arc<GoalService>>,
    Query(params): Query<GoalQueryParams>,
) -> Result<Json<ApiResponse<Vec<GoalResponseDto>>>> {
    let goals = service.list(user.user_id, params.to_filter()?).await?;
    let meta = Meta::total(goals.len());
    Ok(Json(ApiResponse::success(Some(goals), None, Some(meta))))
}

/// Get a single goal
#[utoipa::path(
    get,
    path = "/api/goals/{id}",
    params(
        ("id" = i64, Path, description = "Goal ID")
    ),
    responses(
        (status = 200, description = "Goal found", body = ApiResponse<GoalResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Goal belongs to another user"),
        (status = 404, description = "Goal not found")
    ),
    tag = "goals",
    security(
        ("session_cookie" = [])
    )
)]
pub async fn get_goal(
    user: AuthenticatedUser,
    State(service): State<Arc<GoalService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<GoalResponseDto>>> {
    let goal = service.get(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(Some(goal), None, None)))
}

/// Create a goal
#[utoipa::path(
    post,
    path = "/api/goals",
    request_body = GoalFormDto,
    responses(
        (status = 201, description = "Goal created", body = ApiResponse<GoalResponseDto>),
        (status = 400, description = "Validation error, invalid timeframe or category"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Goal already exists in this category and timeframe")
    ),
    tag = "goals",
    security(
        ("session_cookie" = [])
    )
)]
pub async fn create_goal(
    user: AuthenticatedUser,
    State(service): State<Arc<GoalService>>,
    AppJson(dto): AppJson<GoalFormDto>,
) -> Result<(StatusCode, Json<ApiResponse<GoalResponseDto>>)> {
    let goal = service.create(user.user_id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(goal),
            Some("Goal created successfully".to_string()),
            None,
        )),
    ))
}

/// Replace a goal
#[utoipa::path(
    put,
    path = "/api/goals/{id}",
    params(
        ("id" = i64, Path, description = "Goal ID")
    ),
    request_body = GoalFormDto,
    responses(
        (status = 200, description = "Goal updated", body = ApiResponse<GoalResponseDto>),
        (status = 400, description = "Validation error, invalid timeframe or category"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Goal belongs to another user"),
        (status = 404, description = "Goal not found"),
        (status = 409, description = "Goal already exists in this category and timeframe")
    ),
    tag = "goals",
    security(
        ("session_cookie" = [])
    )
)]
pub async fn update_goal(
    user: AuthenticatedUser,
    State(service): State<Arc<GoalService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<GoalFormDto>,
) -> Result<Json<ApiResponse<GoalResponseDto>>> {
    let goal = service.update(user.user_id, id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(goal),
        Some("Goal updated successfully".to_string()),
        None,
    )))
}

/// Delete a goal
#[utoipa::path(
    delete,
    path = "/api/goals/{id}",
    params(
        ("id" = i64, Path, description = "Goal ID")
    ),
    responses(
        (status = 200, description = "Goal deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Goal belongs to another user"),
        (status = 404, description = "Goal not found")
    ),
    tag = "goals",
    security(
        ("session_cookie" = [])
    )
)]
pub async fn delete_goal(
    user: AuthenticatedUser,
    State(service): State<Arc<GoalService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Goal deleted successfully".to_string()),
        None,
    )))
}

/// Flip a goal's done flag
#[utoipa::path(
    post,
    path = "/api/goals/{id}/toggle-done",
    params(
        ("id" = i64, Path, description = "Goal ID")
    ),
    responses(
        (status = 200, description = "Done flag toggled", body = ApiResponse<GoalResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Goal belongs to another user"),
        (status = 404, description = "Goal not found")
    ),
    tag = "goals",
    security(
        ("session_cookie" = [])
    )
)]
pub async fn toggle_done(
    user: AuthenticatedUser,
    State(service): State<Arc<GoalService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<GoalResponseDto>>> {
    let goal = service.toggle_done(user.user_id, id).await?;
    let message = if goal.done {
        "Goal marked as done"
    } else {
        "Goal marked as not done"
    };
    Ok(Json(ApiResponse::success(
        Some(goal),
        Some(message.to_string()),
        None,
    )))
}

/// Flip a goal's important flag
#[utoipa::path(
    post,
    path = "/api/goals/{id}/toggle-important",
    params(
        ("id" = i64, Path, description = "Goal ID")
    ),
    responses(
        (status = 200, description = "Important flag toggled", body = ApiResponse<GoalResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Goal belongs to another user"),
        (status = 404, description = "Goal not found")
    ),
    tag = "goals",
    security(
        ("session_cookie" = [])
    )
)]
pub async fn toggle_important(
    user: AuthenticatedUser,
    State(service): State<Arc<GoalService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<GoalResponseDto>>> {
    let goal = service.toggle_important(user.user_id, id).await?;
    let message = if goal.important {
        "Goal marked as important"
    } else {
        "Goal marked as not important"
    };
    Ok(Json(ApiResponse::success(
        Some(goal),
        Some(message.to_string()),
        None,
    )))
}
