use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::goals::dtos::{GoalFormDto, GoalInput, GoalResponseDto};
use crate::features::goals::models::{Goal, NewGoal};
use crate::modules::store::{conflict_message, GoalFilter, Store, INVALID_CATEGORY, UNIQUE_GOAL};

/// Service for per-user goal operations
pub struct GoalService {
    store: Arc<dyn Store>,
}

impl GoalService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: i64, filter: GoalFilter) -> Result<Vec<GoalResponseDto>> {
        let goals = self.store.list_goals(user_id, filter).await?;
        Ok(goals.into_iter().map(|g| g.into()).collect())
    }

    pub async fn get(&self, user_id: i64, id: i64) -> Result<GoalResponseDto> {
        Ok(self.owned(user_id, id).await?.into())
    }

    /// Create a goal in one of the user's categories
    pub async fn create(&self, user_id: i64, dto: GoalFormDto) -> Result<GoalResponseDto> {
        let input = GoalInput::try_from(dto)?;
        self.ensure_category(user_id, input.category_id).await?;
        self.ensure_unique(user_id, &input, None).await?;

        let goal = self
            .store
            .create_goal(NewGoal {
                user_id,
                category_id: input.category_id,
                name: input.name,
                description: input.description,
                important: input.important,
                done: input.done,
                timeframe: input.timeframe,
            })
            .await?;

        tracing::info!(
            "Goal created: id={}, user_id={}, category_id={}, timeframe={}",
            goal.id,
            user_id,
            goal.category_id,
            goal.timeframe
        );

        Ok(goal.into())
    }

    /// Replace every editable field of a goal
    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        dto: GoalFormDto,
    ) -> Result<GoalResponseDto> {
        let mut goal = self.owned(user_id, id).await?;

        let input = GoalInput::try_from(dto)?;
        self.ensure_category(user_id, input.category_id).await?;
        self.ensure_unique(user_id, &input, Some(id)).await?;

        goal.category_id = input.category_id;
        goal.name = input.name;
        goal.description = input.description;
        goal.important = input.important;
        goal.done = input.done;
        goal.timeframe = input.timeframe;
        let goal = self.store.update_goal(goal).await?;

        tracing::info!("Goal updated: id={}, user_id={}", id, user_id);

        Ok(goal.into())
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        self.owned(user_id, id).await?;
        self.store.delete_goal(id).await?;

        tracing::info!("Goal deleted: id={}, user_id={}", id, user_id);

        Ok(())
    }

    pub async fn toggle_done(&self, user_id: i64, id: i64) -> Result<GoalResponseDto> {
        let mut goal = self.owned(user_id, id).await?;
        goal.done = !goal.done;
        let goal = self.store.update_goal(goal).await?;

        tracing::info!("Goal done toggled: id={}, done={}", id, goal.done);

        Ok(goal.into())
    }

    pub async fn toggle_important(&self, user_id: i64, id: i64) -> Result<GoalResponseDto> {
        let mut goal = self.owned(user_id, id).await?;
        goal.important = !goal.important;
        let goal = self.store.update_goal(goal).await?;

        tracing::info!(
            "Goal important toggled: id={}, important={}",
            id,
            goal.important
        );

        Ok(goal.into())
    }

    /// `NotFound` when the goal does not exist, `Forbidden` when it is someone else's
    async fn owned(&self, user_id: i64, id: i64) -> Result<Goal> {
        let goal = self
            .store
            .get_goal(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Goal not found".to_string()))?;

        if goal.user_id != user_id {
            tracing::warn!(
                "User {} tried to access goal {} owned by {}",
                user_id,
                id,
                goal.user_id
            );
            return Err(AppError::Forbidden(
                "You do not have permission to modify this goal".to_string(),
            ));
        }

        Ok(goal)
    }

    async fn ensure_category(&self, user_id: i64, category_id: i64) -> Result<()> {
        match self.store.get_category(category_id).await? {
            Some(category) if category.user_id == user_id => Ok(()),
            _ => Err(AppError::Validation(INVALID_CATEGORY.to_string())),
        }
    }

    /// `(owner, category, timeframe, name)` must not belong to another goal
    async fn ensure_unique(
        &self,
        user_id: i64,
        input: &GoalInput,
        except: Option<i64>,
    ) -> Result<()> {
        let clash = self
            .store
            .find_goal_by_name(user_id, input.category_id, input.timeframe, &input.name)
            .await?
            .is_some_and(|other| Some(other.id) != except);

        if clash {
            return Err(AppError::Conflict(conflict_message(UNIQUE_GOAL).to_string()));
        }
        Ok(())
    }
}
