use crate::storage::{JsonStore, StorageError};
use crate::workouts::repo_types::DashboardSnapshot;

pub fn dashboard_key(user_id: i64) -> String {
    format!("dashboard_{user_id}")
}

/// Reads a user's dashboard blob, `None` if the user has never saved one.
pub fn load_dashboard(store: &JsonStore, user_id: i64) -> Result<Option<DashboardSnapshot>, StorageError> {
    store.get(&dashboard_key(user_id))
}

pub fn save_dashboard(store: &JsonStore, user_id: i64, snapshot: &DashboardSnapshot) -> Result<(), StorageError> {
    store.set(&dashboard_key(user_id), snapshot)
}
