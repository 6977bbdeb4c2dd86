mod goal_handler;

pub use goal_handler::*;
