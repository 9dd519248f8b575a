pub mod dto;
pub mod repo;
mod repo_types;
pub mod services;

pub use dto::{CalorieStatus, CalorieSummary};
pub use repo_types::{DailyNutrition, ExerciseSession, FoodItem};
pub use services::{NutritionError, NutritionLog};
