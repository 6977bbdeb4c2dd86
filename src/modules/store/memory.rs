//! In-memory store implementation.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    conflict_message, GoalFilter, Store, CATEGORY_HAS_GOALS, INVALID_CATEGORY,
    UNIQUE_CATEGORY_COLOR, UNIQUE_CATEGORY_NAME, UNIQUE_GOAL, UNIQUE_USERNAME,
};
use crate::core::error::{AppError, Result};
use crate::features::auth::models::{NewUser, Session, User};
use crate::features::categories::models::{Category, NewCategory};
use crate::features::goals::models::{Goal, NewGoal, Timeframe};

#[derive(Debug, Default)]
struct Tables {
    next_user_id: i64,
    next_category_id: i64,
    next_goal_id: i64,
    users: BTreeMap<i64, User>,
    sessions: HashMap<String, Session>,
    categories: BTreeMap<i64, Category>,
    goals: BTreeMap<i64, Goal>,
}

impl Tables {
    fn conflict(constraint: &str) -> AppError {
        AppError::Conflict(conflict_message(constraint).to_string())
    }

    fn check_category_unique(
        &self,
        id: Option<i64>,
        user_id: i64,
        name: &str,
        color: &str,
    ) -> Result<()> {
        let others = self
            .categories
            .values()
            .filter(|c| c.user_id == user_id && Some(c.id) != id);

        for other in others {
            if other.name == name {
                return Err(Self::conflict(UNIQUE_CATEGORY_NAME));
            }
            if other.color == color {
                return Err(Self::conflict(UNIQUE_CATEGORY_COLOR));
            }
        }
        Ok(())
    }

    fn check_goal_unique(
        &self,
        id: Option<i64>,
        user_id: i64,
        category_id: i64,
        timeframe: Timeframe,
        name: &str,
    ) -> Result<()> {
        let taken = self.goals.values().any(|g| {
            Some(g.id) != id
                && g.user_id == user_id
                && g.category_id == category_id
                && g.timeframe == timeframe
                && g.name == name
        });

        if taken {
            return Err(Self::conflict(UNIQUE_GOAL));
        }
        Ok(())
    }

    fn check_category_exists(&self, category_id: i64) -> Result<()> {
        if !self.categories.contains_key(&category_id) {
            return Err(AppError::Validation(INVALID_CATEGORY.to_string()));
        }
        Ok(())
    }

    fn check_user_exists(&self, user_id: i64) -> Result<()> {
        if !self.users.contains_key(&user_id) {
            return Err(AppError::Validation("Unknown user".to_string()));
        }
        Ok(())
    }
}

/// In-memory store with the same constraint semantics as the SQL schema.
///
/// A single lock guards all tables, so each check-and-write is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(Tables::conflict(UNIQUE_USERNAME));
        }

        tables.next_user_id += 1;
        let created = User {
            id: tables.next_user_id,
            username: user.username,
            password_hash: user.password_hash,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    // =========================================================================
    // Session operations
    // =========================================================================

    async fn create_session(&self, session: Session) -> Result<Session> {
        let mut tables = self.tables.write().await;
        tables.check_user_exists(session.user_id)?;
        if tables.sessions.contains_key(&session.token) {
            return Err(AppError::Conflict("Session already exists".to_string()));
        }
        tables
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.sessions.remove(token);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - tables.sessions.len()) as u64)
    }

    // =========================================================================
    // Category operations
    // =========================================================================

    async fn create_category(&self, category: NewCategory) -> Result<Category> {
        let mut tables = self.tables.write().await;
        tables.check_user_exists(category.user_id)?;
        tables.check_category_unique(None, category.user_id, &category.name, &category.color)?;

        tables.next_category_id += 1;
        let now = Utc::now();
        let created = Category {
            id: tables.next_category_id,
            user_id: category.user_id,
            name: category.name,
            color: category.color,
            created_at: now,
            updated_at: now,
        };
        tables.categories.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.get(&id).cloned())
    }

    async fn find_category_by_name(&self, user_id: i64, name: &str) -> Result<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .values()
            .find(|c| c.user_id == user_id && c.name == name)
            .cloned())
    }

    async fn find_category_by_color(
        &self,
        user_id: i64,
        color: &str,
    ) -> Result<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .values()
            .find(|c| c.user_id == user_id && c.color == color)
            .cloned())
    }

    async fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn update_category(&self, category: Category) -> Result<Category> {
        let mut tables = self.tables.write().await;
        let user_id = match tables.categories.get(&category.id) {
            Some(existing) => existing.user_id,
            None => {
                return Err(AppError::NotFound(format!(
                    "Category {} not found",
                    category.id
                )))
            }
        };
        tables.check_category_unique(
            Some(category.id),
            user_id,
            &category.name,
            &category.color,
        )?;

        let updated = tables
            .categories
            .get_mut(&category.id)
            .map(|existing| {
                existing.name = category.name;
                existing.color = category.color;
                existing.updated_at = Utc::now();
                existing.clone()
            })
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", category.id)))?;
        Ok(updated)
    }

    async fn delete_category(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.goals.values().any(|g| g.category_id == id) {
            return Err(AppError::Conflict(CATEGORY_HAS_GOALS.to_string()));
        }
        if tables.categories.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }

    // =========================================================================
    // Goal operations
    // =========================================================================

    async fn create_goal(&self, goal: NewGoal) -> Result<Goal> {
        let mut tables = self.tables.write().await;
        tables.check_user_exists(goal.user_id)?;
        tables.check_category_exists(goal.category_id)?;
        tables.check_goal_unique(
            None,
            goal.user_id,
            goal.category_id,
            goal.timeframe,
            &goal.name,
        )?;

        tables.next_goal_id += 1;
        let now = Utc::now();
        let created = Goal {
            id: tables.next_goal_id,
            user_id: goal.user_id,
            category_id: goal.category_id,
            name: goal.name,
            description: goal.description,
            important: goal.important,
            done: goal.done,
            timeframe: goal.timeframe,
            created_at: now,
            updated_at: now,
        };
        tables.goals.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_goal(&self, id: i64) -> Result<Option<Goal>> {
        let tables = self.tables.read().await;
        Ok(tables.goals.get(&id).cloned())
    }

    async fn find_goal_by_name(
        &self,
        user_id: i64,
        category_id: i64,
        timeframe: Timeframe,
        name: &str,
    ) -> Result<Option<Goal>> {
        let tables = self.tables.read().await;
        Ok(tables
            .goals
            .values()
            .find(|g| {
                g.user_id == user_id
                    && g.category_id == category_id
                    && g.timeframe == timeframe
                    && g.name == name
            })
            .cloned())
    }

    async fn list_goals(&self, user_id: i64, filter: GoalFilter) -> Result<Vec<Goal>> {
        let tables = self.tables.read().await;
        Ok(tables
            .goals
            .values()
            .filter(|g| g.user_id == user_id)
            .filter(|g| filter.category_id.map_or(true, |id| g.category_id == id))
            .filter(|g| filter.timeframe.map_or(true, |t| g.timeframe == t))
            .cloned()
            .collect())
    }

    async fn count_goals_in_category(&self, category_id: i64) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .goals
            .values()
            .filter(|g| g.category_id == category_id)
            .count() as i64)
    }

    async fn update_goal(&self, goal: Goal) -> Result<Goal> {
        let mut tables = self.tables.write().await;
        let user_id = match tables.goals.get(&goal.id) {
            Some(existing) => existing.user_id,
            None => return Err(AppError::NotFound(format!("Goal {} not found", goal.id))),
        };
        tables.check_category_exists(goal.category_id)?;
        tables.check_goal_unique(
            Some(goal.id),
            user_id,
            goal.category_id,
            goal.timeframe,
            &goal.name,
        )?;

        let updated = tables
            .goals
            .get_mut(&goal.id)
            .map(|existing| {
                existing.category_id = goal.category_id;
                existing.name = goal.name;
                existing.description = goal.description;
                existing.important = goal.important;
                existing.done = goal.done;
                existing.timeframe = goal.timeframe;
                existing.updated_at = Utc::now();
                existing.clone()
            })
            .ok_or_else(|| AppError::NotFound(format!("Goal {} not found", goal.id)))?;
        Ok(updated)
    }

    async fn delete_goal(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.goals.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Goal {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(store: &MemoryStore, username: &str) -> User {
        store
            .create_user(NewUser {
                username: username.to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    fn new_category(user_id: i64, name: &str, color: &str) -> NewCategory {
        NewCategory {
            user_id,
            name: name.to_string(),
            color: color.to_string(),
        }
    }

    #[tokio::test]
    async fn test_username_unique() {
        let store = MemoryStore::new();
        seed_user(&store, "alice").await;

        let err = store
            .create_user(NewUser {
                username: "alice".to_string(),
                password_hash: "other".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_category_constraints_are_per_user() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;

        store
            .create_category(new_category(alice.id, "Work", "#112233"))
            .await
            .unwrap();

        let same_name = store
            .create_category(new_category(alice.id, "Work", "#445566"))
            .await
            .unwrap_err();
        assert!(matches!(same_name, AppError::Conflict(_)));

        let same_color = store
            .create_category(new_category(alice.id, "Home", "#112233"))
            .await
            .unwrap_err();
        assert!(matches!(same_color, AppError::Conflict(_)));

        store
            .create_category(new_category(bob.id, "Work", "#112233"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_category_with_goals_is_restricted() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let category = store
            .create_category(new_category(alice.id, "Work", "#112233"))
            .await
            .unwrap();
        let goal = store
            .create_goal(NewGoal {
                user_id: alice.id,
                category_id: category.id,
                name: "Ship".to_string(),
                description: String::new(),
                important: false,
                done: false,
                timeframe: Timeframe::Month,
            })
            .await
            .unwrap();

        let err = store.delete_category(category.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        store.delete_goal(goal.id).await.unwrap();
        store.delete_category(category.id).await.unwrap();
        assert!(store.get_category(category.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_pruned() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let now = Utc::now();

        for (token, offset) in [("old", -10), ("fresh", 3600)] {
            store
                .create_session(Session {
                    token: token.to_string(),
                    user_id: alice.id,
                    created_at: now,
                    expires_at: now + chrono::Duration::seconds(offset),
                })
                .await
                .unwrap();
        }

        assert_eq!(store.delete_expired_sessions(now).await.unwrap(), 1);
        assert!(store.get_session("old").await.unwrap().is_none());
        assert!(store.get_session("fresh").await.unwrap().is_some());
    }
}
