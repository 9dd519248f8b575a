use crate::nutrition::repo_types::DailyNutrition;
use crate::storage::{JsonStore, StorageError};

pub fn nutrition_key(user_id: i64) -> String {
    format!("nutrition_{user_id}")
}

pub fn load_day(store: &JsonStore, user_id: i64) -> Result<Option<DailyNutrition>, StorageError> {
    store.get(&nutrition_key(user_id))
}

pub fn save_day(store: &JsonStore, user_id: i64, day: &DailyNutrition) -> Result<(), StorageError> {
    store.set(&nutrition_key(user_id), day)
}
