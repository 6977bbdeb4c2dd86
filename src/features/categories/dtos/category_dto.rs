use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::categories::models::Category;
use crate::shared::validation::HEX_COLOR_REGEX;

/// Request DTO for creating a category. The color is assigned by the server.
///
/// Name length is checked on the normalized name by the service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCategoryDto {
    pub name: String,
}

/// Request DTO for updating a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryDto {
    pub name: String,

    /// `#rrggbb`, stored lowercase
    #[validate(regex(
        path = *HEX_COLOR_REGEX,
        message = "Color must be a hex color like #1a2b3c"
    ))]
    pub color: String,
}

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            color: c.color,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_dto_color_format() {
        let mut dto = UpdateCategoryDto {
            name: "Work".to_string(),
            color: "#A1b2C3".to_string(),
        };
        assert!(dto.validate().is_ok());

        dto.color = "red".to_string();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("color"));
    }

    #[test]
    fn test_update_dto_leaves_name_to_service() {
        let dto = UpdateCategoryDto {
            name: format!("  {}  ", "a".repeat(100)),
            color: "#000000".to_string(),
        };
        assert!(dto.validate().is_ok());
    }
}
