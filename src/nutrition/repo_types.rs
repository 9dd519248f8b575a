use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(day_format, Date, "[year]-[month]-[day]");

fn default_minutes() -> u32 {
    15
}

fn default_target() -> u32 {
    2000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    #[serde(deserialize_with = "crate::legacy::id")]
    pub id: Uuid,
    pub name: String,
    pub grams: u32,
    pub calories: u32,
    #[serde(
        default,
        serialize_with = "time::serde::rfc3339::option::serialize",
        deserialize_with = "crate::legacy::timestamp"
    )]
    pub time: Option<OffsetDateTime>,
}

/// A finished follow-along exercise video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSession {
    #[serde(deserialize_with = "crate::legacy::id")]
    pub id: Uuid,
    pub title: String,
    pub calories: u32,
    #[serde(default = "default_minutes")]
    pub minutes: u32,
    #[serde(
        default,
        serialize_with = "time::serde::rfc3339::option::serialize",
        deserialize_with = "crate::legacy::timestamp"
    )]
    pub time: Option<OffsetDateTime>,
}

/// Blob stored under `nutrition_<user id>`; only valid for `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyNutrition {
    #[serde(serialize_with = "day_format::serialize", deserialize_with = "crate::legacy::day")]
    pub date: Date,
    #[serde(default)]
    pub food_log: Vec<FoodItem>,
    #[serde(default)]
    pub videos_watched: Vec<ExerciseSession>,
    #[serde(default = "default_target")]
    pub calorie_target: u32,
}

impl DailyNutrition {
    pub fn new(date: Date, calorie_target: u32) -> Self {
        Self {
            date,
            food_log: Vec::new(),
            videos_watched: Vec::new(),
            calorie_target,
        }
    }
}
