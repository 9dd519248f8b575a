use thiserror::Error;
use time::{Date, OffsetDateTime};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::nutrition::dto::{CalorieStatus, CalorieSummary};
use crate::nutrition::repo::{load_day, save_day};
use crate::nutrition::repo_types::{DailyNutrition, ExerciseSession, FoodItem};
use crate::storage::{JsonStore, Persisted, StorageError};

/// Net intake within this many kcal of the target counts as balanced.
const BALANCE_BAND: i64 = 500;
const EXERCISE_MINUTES: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NutritionError {
    #[error("Please fill all fields")]
    MissingField,
    #[error("Calorie target must be greater than zero")]
    InvalidTarget,
}

/// Today's food and exercise log for one user.
pub struct NutritionLog {
    store: JsonStore,
    user_id: i64,
    day: DailyNutrition,
}

impl NutritionLog {
    /// Restores today's log. A log saved on another day, or one that cannot
    /// be read, is replaced by an empty day at the default target.
    pub fn load(
        store: JsonStore,
        user_id: i64,
        today: Date,
        default_target: u32,
    ) -> Result<Self, StorageError> {
        let saved = match load_day(&store, user_id) {
            Ok(saved) => saved,
            Err(e @ StorageError::Corrupt { .. }) => {
                error!(error = %e, user_id, "unreadable nutrition log, starting a new day");
                None
            }
            Err(e) => return Err(e),
        };
        let day = match saved {
            Some(saved) if saved.date == today => saved,
            Some(stale) => {
                debug!(user_id, stale = %stale.date, "starting a new nutrition day");
                DailyNutrition::new(today, default_target)
            }
            None => DailyNutrition::new(today, default_target),
        };
        Ok(Self {
            store,
            user_id,
            day,
        })
    }

    pub fn date(&self) -> Date {
        self.day.date
    }

    pub fn food_log(&self) -> &[FoodItem] {
        &self.day.food_log
    }

    pub fn exercises(&self) -> &[ExerciseSession] {
        &self.day.videos_watched
    }

    pub fn calorie_target(&self) -> u32 {
        self.day.calorie_target
    }

    #[instrument(skip(self), fields(user_id = self.user_id))]
    pub fn add_food(
        &mut self,
        name: &str,
        grams: u32,
        calories: u32,
    ) -> Result<Persisted<FoodItem>, NutritionError> {
        let name = name.trim();
        if name.is_empty() || grams == 0 || calories == 0 {
            warn!("incomplete food entry");
            return Err(NutritionError::MissingField);
        }
        let item = FoodItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            grams,
            calories,
            time: Some(OffsetDateTime::now_utc()),
        };
        self.day.food_log.push(item.clone());
        info!(food = %item.name, calories, "food added");
        Ok(Persisted::from_write(item, self.save()))
    }

    pub fn remove_food(&mut self, id: Uuid) -> Persisted<bool> {
        let before = self.day.food_log.len();
        self.day.food_log.retain(|item| item.id != id);
        if self.day.food_log.len() == before {
            return Persisted::from_write(false, Ok(()));
        }
        Persisted::from_write(true, self.save())
    }

    /// Empties today's food log, returning how many entries were dropped.
    pub fn clear_food(&mut self) -> Persisted<usize> {
        let cleared = self.day.food_log.len();
        self.day.food_log.clear();
        info!(user_id = self.user_id, cleared, "food log cleared");
        Persisted::from_write(cleared, self.save())
    }

    #[instrument(skip(self), fields(user_id = self.user_id))]
    pub fn complete_exercise(
        &mut self,
        title: &str,
        calories: u32,
    ) -> Result<Persisted<ExerciseSession>, NutritionError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(NutritionError::MissingField);
        }
        let session = ExerciseSession {
            id: Uuid::new_v4(),
            title: title.to_string(),
            calories,
            minutes: EXERCISE_MINUTES,
            time: Some(OffsetDateTime::now_utc()),
        };
        self.day.videos_watched.push(session.clone());
        info!(exercise = %session.title, calories, "exercise completed");
        Ok(Persisted::from_write(session, self.save()))
    }

    pub fn set_calorie_target(&mut self, kcal: u32) -> Result<Persisted<u32>, NutritionError> {
        if kcal == 0 {
            return Err(NutritionError::InvalidTarget);
        }
        self.day.calorie_target = kcal;
        Ok(Persisted::from_write(kcal, self.save()))
    }

    pub fn summary(&self) -> CalorieSummary {
        let consumed: u64 = self.day.food_log.iter().map(|f| u64::from(f.calories)).sum();
        let burned: u64 = self.day.videos_watched.iter().map(|v| u64::from(v.calories)).sum();
        let target = self.day.calorie_target;
        let net = signed(consumed) - signed(burned);

        let status = if net < i64::from(target) - BALANCE_BAND {
            CalorieStatus::Deficit
        } else if net > i64::from(target) + BALANCE_BAND {
            CalorieStatus::Surplus
        } else {
            CalorieStatus::Balanced
        };

        let progress_percent = if target == 0 {
            0.0
        } else {
            (consumed as f64 / f64::from(target) * 100.0).min(100.0)
        };

        CalorieSummary {
            consumed,
            burned,
            net,
            target,
            progress_percent,
            status,
            exercise_count: self.day.videos_watched.len(),
            exercise_minutes: self.day.videos_watched.iter().map(|v| u64::from(v.minutes)).sum(),
        }
    }

    fn save(&self) -> Result<(), StorageError> {
        save_day(&self.store, self.user_id, &self.day)
    }
}

fn signed(kcal: u64) -> i64 {
    i64::try_from(kcal).unwrap_or(i64::MAX)
}
