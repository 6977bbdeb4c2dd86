use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::goals::handlers;
use crate::features::goals::services::GoalService;

/// Create routes for the goals feature (session required)
pub fn routes(service: Arc<GoalService>) -> Router {
    Router::new()
        .route(
            "/api/goals",
            get(handlers::list_goals).post(handlers::create_goal),
        )
        .route(
            "/api/goals/{id}",
            get(handlers::get_goal)
                .put(handlers::update_goal)
                .delete(handlers::delete_goal),
        )
        .route("/api/goals/{id}/toggle-done", post(handlers::toggle_done))
        .route(
            "/api/goals/{id}/toggle-important",
            post(handlers::toggle_important),
        )
        .with_state(service)
}
