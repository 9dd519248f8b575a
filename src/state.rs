use std::rc::Rc;

use thiserror::Error;
use time::{Date, OffsetDateTime};
use tracing::warn;

use crate::auth::AuthService;
use crate::calendar::CalendarMonth;
use crate::config::AppConfig;
use crate::nutrition::NutritionLog;
use crate::storage::{JsonStore, KeyValueStore, MemoryStore, StorageError};
use crate::workouts::WorkoutLog;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Please log in first")]
    NotLoggedIn,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The application service object, built once at startup and handed to the
/// view layer by reference.
pub struct AppState {
    config: AppConfig,
    store: JsonStore,
    auth: AuthService,
}

impl AppState {
    /// Runs the startup sequence over an already opened backend: load users,
    /// seed the demo account if enabled, restore the session.
    pub fn from_parts(config: AppConfig, backend: Rc<dyn KeyValueStore>) -> Self {
        let store = JsonStore::new(backend, config.key_prefix.clone());
        let mut auth = AuthService::load(store.clone());
        if config.seed_demo {
            auth.seed_demo_account();
        }
        Self {
            config,
            store,
            auth,
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(config, Rc::new(MemoryStore::new()))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut AuthService {
        &mut self.auth
    }

    /// Today in the configured offset.
    pub fn today(&self) -> Date {
        OffsetDateTime::now_utc().to_offset(self.config.utc_offset).date()
    }

    fn current_user_id(&self) -> Result<i64, AppError> {
        self.auth
            .current_user()
            .map(|u| u.id)
            .ok_or(AppError::NotLoggedIn)
    }

    /// The signed-in user's workouts. A user without saved workouts gets the
    /// demo set when demo seeding is enabled.
    pub fn workouts(&self) -> Result<WorkoutLog, AppError> {
        let user_id = self.current_user_id()?;
        let mut log = WorkoutLog::load(self.store.clone(), user_id)?;
        if log.is_new() && self.config.seed_demo {
            let seeded = log.seed_demo_workouts(OffsetDateTime::now_utc());
            if let Some(e) = seeded.persist_error {
                warn!(error = %e, user_id, "demo workouts not saved");
            }
        }
        Ok(log)
    }

    pub fn nutrition(&self) -> Result<NutritionLog, AppError> {
        let user_id = self.current_user_id()?;
        Ok(NutritionLog::load(
            self.store.clone(),
            user_id,
            self.today(),
            self.config.calorie_target,
        )?)
    }

    pub fn current_month(&self) -> CalendarMonth {
        CalendarMonth::containing(self.today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::services::{DEMO_EMAIL, DEMO_PASSWORD};

    #[test]
    fn startup_seeds_demo_account() {
        let state = AppState::in_memory(AppConfig::default());
        assert_eq!(state.auth().directory().len(), 1);
        assert!(state.auth().directory().find_by_email(DEMO_EMAIL).is_some());
        assert!(!state.auth().is_logged_in());
    }

    #[test]
    fn seeding_can_be_disabled() {
        let config = AppConfig {
            seed_demo: false,
            ..AppConfig::default()
        };
        let state = AppState::in_memory(config);
        assert!(state.auth().directory().is_empty());
    }

    #[test]
    fn startup_restores_state_from_shared_backend() {
        let backend: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
        let mut first = AppState::from_parts(AppConfig::default(), backend.clone());
        let _ = first.auth_mut().login(DEMO_EMAIL, DEMO_PASSWORD).unwrap();

        let second = AppState::from_parts(AppConfig::default(), backend);
        assert_eq!(second.auth().directory().len(), 1);
        assert_eq!(second.auth().current_user().map(|u| u.login_count), Some(1));
    }

    #[test]
    fn user_data_requires_login() {
        let state = AppState::in_memory(AppConfig::default());
        assert!(matches!(state.workouts(), Err(AppError::NotLoggedIn)));
        assert!(matches!(state.nutrition(), Err(AppError::NotLoggedIn)));
    }

    #[test]
    fn signed_in_user_gets_demo_workouts_and_todays_log() {
        let mut state = AppState::in_memory(AppConfig::default());
        let _ = state.auth_mut().login(DEMO_EMAIL, DEMO_PASSWORD).unwrap();

        let workouts = state.workouts().unwrap();
        assert_eq!(workouts.workouts().len(), 3);
        assert!(!workouts.is_new());

        let nutrition = state.nutrition().unwrap();
        assert_eq!(nutrition.date(), state.today());
        assert_eq!(nutrition.calorie_target(), 2000);
        assert!(state.current_month().contains(state.today()));
    }

    #[test]
    fn browser_client_blobs_do_not_lock_out_the_user() {
        let backend: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
        let mut state = AppState::from_parts(AppConfig::default(), backend.clone());
        let _ = state.auth_mut().login(DEMO_EMAIL, DEMO_PASSWORD).unwrap();
        let id = state.auth().current_user().map(|u| u.id).unwrap();

        backend
            .set(
                &format!("fittrack_dashboard_{id}"),
                r#"{"workouts":[{"id":1,"date":"2024-05-10T07:00:00.000Z","type":"Running","duration":30,"calories":320,"notes":"Morning run"}],"stats":{"totalWorkouts":42},"lastUpdated":"2024-05-10T07:00:00.000Z"}"#,
            )
            .unwrap();
        backend
            .set(
                &format!("fittrack_nutrition_{id}"),
                r#"{"date":"Thu Jan 01 1970","foodLog":[{"id":1715324712000,"name":"Apple","grams":180,"calories":95,"time":"7:05:12 AM"}],"videosWatched":[],"calorieTarget":1800}"#,
            )
            .unwrap();

        let workouts = state.workouts().unwrap();
        assert_eq!(workouts.workouts().len(), 1);
        assert_eq!(workouts.workouts()[0].kind, "Running");

        let mut nutrition = state.nutrition().unwrap();
        assert!(nutrition.food_log().is_empty());
        assert!(nutrition.add_food("Banana", 120, 105).unwrap().is_persisted());
        assert_eq!(state.nutrition().unwrap().food_log().len(), 1);
    }
}
