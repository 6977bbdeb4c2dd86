/// Attempts the category color generator makes before giving up
pub const MAX_COLOR_ATTEMPTS: usize = 64;

/// Column limits, mirrored by the schema
pub const MAX_USERNAME_LENGTH: usize = 120;
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;
pub const MAX_GOAL_NAME_LENGTH: usize = 100;
pub const MAX_GOAL_DESCRIPTION_LENGTH: usize = 255;
