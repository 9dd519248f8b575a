use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Form payload for logging a workout.
#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkout {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub duration: u32,
    pub calories: u32,
    #[serde(default)]
    pub notes: String,
}

/// Headline numbers for the dashboard cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_workouts: usize,
    pub calories_burned: u64,
    pub active_minutes: u64,
    pub current_streak: u32,
}

/// Share of workouts of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeShare {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: usize,
    pub percent: u32,
}
