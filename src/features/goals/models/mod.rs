mod goal;

pub use goal::{Goal, NewGoal, Timeframe};
