use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{conflict_message, GoalFilter, Store, CATEGORY_HAS_GOALS, INVALID_CATEGORY};
use crate::core::error::{AppError, Result};
use crate::features::auth::models::{NewUser, Session, User};
use crate::features::categories::models::{Category, NewCategory};
use crate::features::goals::models::{Goal, NewGoal, Timeframe};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

const CATEGORY_COLUMNS: &str = "id, user_id, name, color, created_at, updated_at";
const GOAL_COLUMNS: &str = "id, user_id, category_id, name, description, important, done, \
                            timeframe, created_at, updated_at";

/// Map a constraint violation to the error callers see, or `None` for any
/// other SQLSTATE.
///
/// `on_foreign_key` is returned when the statement violated a foreign key,
/// since its meaning depends on which side of the reference was written.
fn constraint_error(
    code: &str,
    constraint: Option<&str>,
    on_foreign_key: AppError,
) -> Option<AppError> {
    match code {
        UNIQUE_VIOLATION => Some(AppError::Conflict(
            conflict_message(constraint.unwrap_or_default()).to_string(),
        )),
        FOREIGN_KEY_VIOLATION => Some(on_foreign_key),
        _ => None,
    }
}

/// Convert database error to a more specific AppError.
fn handle_db_error(e: sqlx::Error, on_foreign_key: AppError, context: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if let Some(code) = db_err.code() {
            if let Some(err) = constraint_error(&code, db_err.constraint(), on_foreign_key) {
                return err;
            }
        }
    }

    tracing::error!("Failed to {}: {:?}", context, e);
    AppError::Database(e)
}

fn unknown_user() -> AppError {
    AppError::Validation("Unknown user".to_string())
}

fn invalid_category() -> AppError {
    AppError::Validation(INVALID_CATEGORY.to_string())
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!("Failed to {}: {:?}", context, e);
        AppError::Database(e)
    }
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("pool", &"<PgPool>")
            .finish()
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, unknown_user(), "create user"))
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get user"))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get user by username"))
    }

    async fn create_session(&self, session: Session) -> Result<Session> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING token, user_id, created_at, expires_at
            "#,
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, unknown_user(), "create session"))
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get session"))
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete session"))?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete expired sessions"))?;
        Ok(result.rows_affected())
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category> {
        let query = format!(
            "INSERT INTO categories (user_id, name, color) VALUES ($1, $2, $3) RETURNING {}",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(category.user_id)
            .bind(&category.name)
            .bind(&category.color)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, unknown_user(), "create category"))
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let query = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get category"))
    }

    async fn find_category_by_name(&self, user_id: i64, name: &str) -> Result<Option<Category>> {
        let query = format!(
            "SELECT {} FROM categories WHERE user_id = $1 AND name = $2",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(user_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find category by name"))
    }

    async fn find_category_by_color(
        &self,
        user_id: i64,
        color: &str,
    ) -> Result<Option<Category>> {
        let query = format!(
            "SELECT {} FROM categories WHERE user_id = $1 AND color = $2",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(user_id)
            .bind(color)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find category by color"))
    }

    async fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let query = format!(
            "SELECT {} FROM categories WHERE user_id = $1 ORDER BY name, id",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list categories"))
    }

    async fn update_category(&self, category: Category) -> Result<Category> {
        let query = format!(
            r#"
            UPDATE categories
            SET name = $2, color = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.color)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, unknown_user(), "update category"))?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", category.id)))
    }

    async fn delete_category(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                handle_db_error(
                    e,
                    AppError::Conflict(CATEGORY_HAS_GOALS.to_string()),
                    "delete category",
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }

    async fn create_goal(&self, goal: NewGoal) -> Result<Goal> {
        let query = format!(
            r#"
            INSERT INTO goals (user_id, category_id, name, description, important, done, timeframe)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            GOAL_COLUMNS
        );
        sqlx::query_as::<_, Goal>(&query)
            .bind(goal.user_id)
            .bind(goal.category_id)
            .bind(&goal.name)
            .bind(&goal.description)
            .bind(goal.important)
            .bind(goal.done)
            .bind(goal.timeframe)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, invalid_category(), "create goal"))
    }

    async fn get_goal(&self, id: i64) -> Result<Option<Goal>> {
        let query = format!("SELECT {} FROM goals WHERE id = $1", GOAL_COLUMNS);
        sqlx::query_as::<_, Goal>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get goal"))
    }

    async fn find_goal_by_name(
        &self,
        user_id: i64,
        category_id: i64,
        timeframe: Timeframe,
        name: &str,
    ) -> Result<Option<Goal>> {
        let query = format!(
            r#"
            SELECT {} FROM goals
            WHERE user_id = $1 AND category_id = $2 AND timeframe = $3 AND name = $4
            "#,
            GOAL_COLUMNS
        );
        sqlx::query_as::<_, Goal>(&query)
            .bind(user_id)
            .bind(category_id)
            .bind(timeframe)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find goal by name"))
    }

    async fn list_goals(&self, user_id: i64, filter: GoalFilter) -> Result<Vec<Goal>> {
        let query = format!(
            r#"
            SELECT {} FROM goals
            WHERE user_id = $1
              AND ($2::BIGINT IS NULL OR category_id = $2)
              AND ($3::goal_timeframe IS NULL OR timeframe = $3)
            ORDER BY id
            "#,
            GOAL_COLUMNS
        );
        sqlx::query_as::<_, Goal>(&query)
            .bind(user_id)
            .bind(filter.category_id)
            .bind(filter.timeframe)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list goals"))
    }

    async fn count_goals_in_category(&self, category_id: i64) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM goals WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("count goals in category"))
    }

    async fn update_goal(&self, goal: Goal) -> Result<Goal> {
        let query = format!(
            r#"
            UPDATE goals
            SET category_id = $2, name = $3, description = $4, important = $5,
                done = $6, timeframe = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            GOAL_COLUMNS
        );
        sqlx::query_as::<_, Goal>(&query)
            .bind(goal.id)
            .bind(goal.category_id)
            .bind(&goal.name)
            .bind(&goal.description)
            .bind(goal.important)
            .bind(goal.done)
            .bind(goal.timeframe)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, invalid_category(), "update goal"))?
            .ok_or_else(|| AppError::NotFound(format!("Goal {} not found", goal.id)))
    }

    async fn delete_goal(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM goals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete goal"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Goal {} not found", id)));
        }
        Ok(())
    }
}
