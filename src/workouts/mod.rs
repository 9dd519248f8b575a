pub mod dto;
pub mod repo;
mod repo_types;
pub mod services;

pub use repo_types::{DashboardSnapshot, Workout};
pub use services::{relative_time, WorkoutError, WorkoutLog};
