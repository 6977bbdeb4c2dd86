//! Store trait definitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::error::Result;
use crate::features::auth::models::{NewUser, Session, User};
use crate::features::categories::models::{Category, NewCategory};
use crate::features::goals::models::{Goal, NewGoal, Timeframe};

/// Filter options for listing goals.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoalFilter {
    pub category_id: Option<i64>,
    pub timeframe: Option<Timeframe>,
}

/// Persistence contract shared by every backend.
///
/// Implementations enforce the same constraints as the SQL schema: a violated
/// unique constraint surfaces as `AppError::Conflict`, a goal pointing at a
/// missing category as `AppError::Validation`, and deleting a category that
/// still has goals as `AppError::Conflict`.
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: i64) -> Result<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    // =========================================================================
    // Session operations
    // =========================================================================

    async fn create_session(&self, session: Session) -> Result<Session>;

    async fn get_session(&self, token: &str) -> Result<Option<Session>>;

    /// Deleting an unknown token is not an error.
    async fn delete_session(&self, token: &str) -> Result<()>;

    /// Removes sessions that expired at or before `now`, returning how many were removed.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64>;

    // =========================================================================
    // Category operations
    // =========================================================================

    async fn create_category(&self, category: NewCategory) -> Result<Category>;

    async fn get_category(&self, id: i64) -> Result<Option<Category>>;

    async fn find_category_by_name(&self, user_id: i64, name: &str) -> Result<Option<Category>>;

    async fn find_category_by_color(&self, user_id: i64, color: &str)
        -> Result<Option<Category>>;

    async fn list_categories(&self, user_id: i64) -> Result<Vec<Category>>;

    async fn update_category(&self, category: Category) -> Result<Category>;

    async fn delete_category(&self, id: i64) -> Result<()>;

    // =========================================================================
    // Goal operations
    // =========================================================================

    async fn create_goal(&self, goal: NewGoal) -> Result<Goal>;

    async fn get_goal(&self, id: i64) -> Result<Option<Goal>>;

    async fn find_goal_by_name(
        &self,
        user_id: i64,
        category_id: i64,
        timeframe: Timeframe,
        name: &str,
    ) -> Result<Option<Goal>>;

    async fn list_goals(&self, user_id: i64, filter: GoalFilter) -> Result<Vec<Goal>>;

    async fn count_goals_in_category(&self, category_id: i64) -> Result<i64>;

    async fn update_goal(&self, goal: Goal) -> Result<Goal>;

    async fn delete_goal(&self, id: i64) -> Result<()>;
}
