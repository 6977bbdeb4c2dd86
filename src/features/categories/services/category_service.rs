use std::sync::Arc;

use rand::RngCore;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{
    CategoryResponseDto, CreateCategoryDto, UpdateCategoryDto,
};
use crate::features::categories::models::{Category, NewCategory};
use crate::modules::store::{
    conflict_message, Store, CATEGORY_HAS_GOALS, UNIQUE_CATEGORY_COLOR, UNIQUE_CATEGORY_NAME,
};
use crate::shared::constants::{MAX_CATEGORY_NAME_LENGTH, MAX_COLOR_ATTEMPTS};
use crate::shared::text::normalized_name;

/// Produces candidate `#rrggbb` colors for new categories
pub type ColorSource = Arc<dyn Fn() -> String + Send + Sync>;

/// Three uniformly random bytes as a lowercase `#rrggbb` string
pub fn random_color() -> String {
    let mut bytes = [0u8; 3];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("#{}", hex::encode(bytes))
}

/// Service for per-user category operations
pub struct CategoryService {
    store: Arc<dyn Store>,
    color_source: ColorSource,
}

impl CategoryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_color_source(store, Arc::new(random_color))
    }

    pub fn with_color_source(store: Arc<dyn Store>, color_source: ColorSource) -> Self {
        Self {
            store,
            color_source,
        }
    }

    /// List the user's categories, ordered by name
    pub async fn list(&self, user_id: i64) -> Result<Vec<CategoryResponseDto>> {
        let categories = self.store.list_categories(user_id).await?;
        Ok(categories.into_iter().map(|c| c.into()).collect())
    }

    pub async fn get(&self, user_id: i64, id: i64) -> Result<CategoryResponseDto> {
        Ok(self.owned(user_id, id).await?.into())
    }

    /// Create a category with a freshly generated color
    pub async fn create(&self, user_id: i64, dto: CreateCategoryDto) -> Result<CategoryResponseDto> {
        let name = normalized_name(&dto.name, MAX_CATEGORY_NAME_LENGTH, "Category name")?;

        if self
            .store
            .find_category_by_name(user_id, &name)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                conflict_message(UNIQUE_CATEGORY_NAME).to_string(),
            ));
        }

        let color = self.free_color(user_id).await?;

        let category = self
            .store
            .create_category(NewCategory {
                user_id,
                name,
                color,
            })
            .await?;

        tracing::info!(
            "Category created: id={}, user_id={}, color={}",
            category.id,
            user_id,
            category.color
        );

        Ok(category.into())
    }

    /// Rename and recolor a category. Colliding with itself is fine.
    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        dto: UpdateCategoryDto,
    ) -> Result<CategoryResponseDto> {
        let mut category = self.owned(user_id, id).await?;

        let name = normalized_name(&dto.name, MAX_CATEGORY_NAME_LENGTH, "Category name")?;
        let color = dto.color.trim().to_lowercase();

        let name_taken = self
            .store
            .find_category_by_name(user_id, &name)
            .await?
            .is_some_and(|other| other.id != id);
        if name_taken {
            return Err(AppError::Conflict(
                conflict_message(UNIQUE_CATEGORY_NAME).to_string(),
            ));
        }

        let color_taken = self
            .store
            .find_category_by_color(user_id, &color)
            .await?
            .is_some_and(|other| other.id != id);
        if color_taken {
            return Err(AppError::Conflict(
                conflict_message(UNIQUE_CATEGORY_COLOR).to_string(),
            ));
        }

        category.name = name;
        category.color = color;
        let category = self.store.update_category(category).await?;

        tracing::info!("Category updated: id={}, user_id={}", id, user_id);

        Ok(category.into())
    }

    /// Delete a category. Refused while goals still reference it.
    pub async fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        self.owned(user_id, id).await?;

        if self.store.count_goals_in_category(id).await? > 0 {
            return Err(AppError::Conflict(CATEGORY_HAS_GOALS.to_string()));
        }

        self.store.delete_category(id).await?;

        tracing::info!("Category deleted: id={}, user_id={}", id, user_id);

        Ok(())
    }

    /// Fetch a category, hiding other users' categories behind `NotFound`
    async fn owned(&self, user_id: i64, id: i64) -> Result<Category> {
        self.store
            .get_category(id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    /// Draw colors until one is unused by this user
    async fn free_color(&self, user_id: i64) -> Result<String> {
        for attempt in 1..=MAX_COLOR_ATTEMPTS {
            let color = (self.color_source)().to_lowercase();
            if self
                .store
                .find_category_by_color(user_id, &color)
                .await?
                .is_none()
            {
                return Ok(color);
            }
            tracing::debug!(
                "Color {} already used by user_id={} (attempt {})",
                color,
                user_id,
                attempt
            );
        }

        Err(AppError::Exhausted(format!(
            "Could not find an unused color after {} attempts",
            MAX_COLOR_ATTEMPTS
        )))
    }
}
