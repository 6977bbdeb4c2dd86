use std::sync::Arc;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::categories::dtos::CategoryResponseDto;
use crate::features::dashboard::dtos::{DashboardDto, DashboardSummaryDto};
use crate::features::goals::dtos::GoalResponseDto;
use crate::modules::store::{GoalFilter, Store};

/// Service for the per-user dashboard
pub struct DashboardService {
    store: Arc<dyn Store>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user: AuthenticatedUser) -> Result<DashboardDto> {
        let categories: Vec<CategoryResponseDto> = self
            .store
            .list_categories(user.user_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        let goals: Vec<GoalResponseDto> = self
            .store
            .list_goals(user.user_id, GoalFilter::default())
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        let summary = DashboardSummaryDto::from_parts(&categories, &goals);

        Ok(DashboardDto {
            username: user.username,
            categories,
            goals,
            summary,
        })
    }
}
