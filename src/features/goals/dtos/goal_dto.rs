use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::core::error::{AppError, Result};
use crate::features::goals::models::{Goal, Timeframe};
use crate::modules::store::GoalFilter;
use crate::shared::constants::{MAX_GOAL_DESCRIPTION_LENGTH, MAX_GOAL_NAME_LENGTH};
use crate::shared::text::normalized_name;

/// Request DTO for creating or fully replacing a goal
///
/// Checked by `GoalInput::try_from` after normalization.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GoalFormDto {
    pub name: String,

    pub category_id: i64,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub important: bool,

    #[serde(default)]
    pub done: bool,

    /// One of year, semester, trimester, month (any case)
    #[schema(example = "month")]
    pub timeframe: String,
}

/// Goal fields after normalization and parsing
#[derive(Debug, Clone, PartialEq)]
pub struct GoalInput {
    pub name: String,
    pub category_id: i64,
    pub description: String,
    pub important: bool,
    pub done: bool,
    pub timeframe: Timeframe,
}

impl TryFrom<GoalFormDto> for GoalInput {
    type Error = AppError;

    fn try_from(dto: GoalFormDto) -> Result<Self> {
        let timeframe = dto.timeframe.parse::<Timeframe>()?;
        let name = normalized_name(&dto.name, MAX_GOAL_NAME_LENGTH, "Goal name")?;

        let description = dto.description.trim().to_string();
        if description.chars().count() > MAX_GOAL_DESCRIPTION_LENGTH {
            return Err(AppError::Validation(format!(
                "Description must be at most {} characters",
                MAX_GOAL_DESCRIPTION_LENGTH
            )));
        }

        Ok(Self {
            name,
            category_id: dto.category_id,
            description,
            important: dto.important,
            done: dto.done,
            timeframe,
        })
    }
}

/// Query params for listing goals
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct GoalQueryParams {
    /// Only goals in this category
    pub category_id: Option<i64>,
    /// Only goals with this timeframe (any case)
    pub timeframe: Option<String>,
}

impl GoalQueryParams {
    pub fn to_filter(&self) -> Result<GoalFilter> {
        let timeframe = self
            .timeframe
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(str::parse::<Timeframe>)
            .transpose()?;

        Ok(GoalFilter {
            category_id: self.category_id,
            timeframe,
        })
    }
}

/// Response DTO for goal
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GoalResponseDto {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: String,
    pub important: bool,
    pub done: bool,
    pub timeframe: Timeframe,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Goal> for GoalResponseDto {
    fn from(g: Goal) -> Self {
        Self {
            id: g.id,
            category_id: g.category_id,
            name: g.name,
            description: g.description,
            important: g.important,
            done: g.done,
            timeframe: g.timeframe,
            created_at: g.created_at,
            updated_at: g.updated_at,
        }
    }
}
