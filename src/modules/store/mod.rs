//! Persistence for users, sessions, categories and goals
//!
//! `PgStore` is the production backend; `MemoryStore` honours the same
//! constraints and backs tests and `STORAGE_BACKEND=memory` runs.

mod memory;
mod postgres;
mod traits;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use traits::{GoalFilter, Store};

pub const UNIQUE_USERNAME: &str = "unique_username";
pub const UNIQUE_CATEGORY_NAME: &str = "unique_category_per_user";
pub const UNIQUE_CATEGORY_COLOR: &str = "unique_color_per_user";
pub const UNIQUE_GOAL: &str = "unique_goal_per_user_category_timeframe";

/// User-facing message for a violated unique constraint
pub fn conflict_message(constraint: &str) -> &'static str {
    match constraint {
        UNIQUE_USERNAME => "Username already exists",
        UNIQUE_CATEGORY_NAME => "Category with this name already exists in your list",
        UNIQUE_CATEGORY_COLOR => "This color is already used by another category",
        UNIQUE_GOAL => "Goal with this name already exists in this category and time period",
        _ => "Record already exists",
    }
}

pub const INVALID_CATEGORY: &str = "Invalid category selected";
pub const CATEGORY_HAS_GOALS: &str =
    "Category still has goals. Delete or move its goals before deleting the category";
