use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;

use crate::core::error::AppError;

/// Goal horizon, matching the `goal_timeframe` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "goal_timeframe", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Year,
    Semester,
    Trimester,
    Month,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::Year,
        Timeframe::Semester,
        Timeframe::Trimester,
        Timeframe::Month,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Year => "year",
            Timeframe::Semester => "semester",
            Timeframe::Trimester => "trimester",
            Timeframe::Month => "month",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; surrounding whitespace is ignored.
impl FromStr for Timeframe {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Timeframe::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Invalid timeframe '{}'. Allowed: year, semester, trimester, month",
                    s.trim()
                ))
            })
    }
}

/// Database model for goal
#[derive(Debug, Clone, FromRow)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: String,
    pub important: bool,
    pub done: bool,
    pub timeframe: Timeframe,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new goal
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub user_id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: String,
    pub important: bool,
    pub done: bool,
    pub timeframe: Timeframe,
}
