use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::categories::dtos::CategoryResponseDto;
use crate::features::goals::dtos::GoalResponseDto;

/// Everything the signed-in home page shows
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardDto {
    pub username: String,
    pub categories: Vec<CategoryResponseDto>,
    pub goals: Vec<GoalResponseDto>,
    pub summary: DashboardSummaryDto,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummaryDto {
    pub total_categories: i64,
    pub total_goals: i64,
    pub done_goals: i64,
    pub important_goals: i64,
}

impl DashboardSummaryDto {
    pub fn from_parts(categories: &[CategoryResponseDto], goals: &[GoalResponseDto]) -> Self {
        Self {
            total_categories: categories.len() as i64,
            total_goals: goals.len() as i64,
            done_goals: goals.iter().filter(|g| g.done).count() as i64,
            important_goals: goals.iter().filter(|g| g.important).count() as i64,
        }
    }
}
