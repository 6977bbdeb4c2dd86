mod goal_service;

pub use goal_service::GoalService;
