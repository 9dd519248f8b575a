use serde::Serialize;

/// Where the day's net intake sits relative to the target, with a 500 kcal
/// band either side counted as balanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalorieStatus {
    Deficit,
    Balanced,
    Surplus,
}

impl CalorieStatus {
    pub fn label(self) -> &'static str {
        match self {
            CalorieStatus::Deficit => "Deficit - Good for weight loss",
            CalorieStatus::Balanced => "Balanced - Maintaining weight",
            CalorieStatus::Surplus => "Surplus - Good for muscle gain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieSummary {
    pub consumed: u64,
    pub burned: u64,
    pub net: i64,
    pub target: u32,
    pub progress_percent: f64, // consumed / target, capped at 100
    pub status: CalorieStatus,
    pub exercise_count: usize,
    pub exercise_minutes: u64,
}
