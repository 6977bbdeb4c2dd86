mod goal_dto;

pub use goal_dto::{GoalFormDto, GoalInput, GoalQueryParams, GoalResponseDto};
