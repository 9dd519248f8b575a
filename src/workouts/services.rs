use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use time::{Date, Duration, OffsetDateTime, UtcOffset};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::storage::{JsonStore, Persisted, StorageError};
use crate::workouts::dto::{DashboardStats, NewWorkout, TypeShare};
use crate::workouts::repo::{load_dashboard, save_dashboard};
use crate::workouts::repo_types::{DashboardSnapshot, Workout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorkoutError {
    #[error("Workout type is required")]
    MissingType,
    #[error("Duration must be greater than zero")]
    InvalidDuration,
}

/// A user's workout history, newest first.
pub struct WorkoutLog {
    store: JsonStore,
    user_id: i64,
    snapshot: DashboardSnapshot,
    saved_before: bool,
}

impl WorkoutLog {
    /// Restores the user's workouts. An unreadable blob yields an empty log
    /// that still counts as saved, so demo data never replaces it.
    pub fn load(store: JsonStore, user_id: i64) -> Result<Self, StorageError> {
        let (saved, saved_before) = match load_dashboard(&store, user_id) {
            Ok(saved) => {
                let found = saved.is_some();
                (saved, found)
            }
            Err(e @ StorageError::Corrupt { .. }) => {
                error!(error = %e, user_id, "unreadable workout log, starting empty");
                (None, true)
            }
            Err(e) => return Err(e),
        };
        let mut snapshot = saved.unwrap_or_default();
        snapshot.workouts.sort_by(|a, b| b.date.cmp(&a.date));
        debug!(user_id, count = snapshot.workouts.len(), "workout log loaded");
        Ok(Self {
            store,
            user_id,
            snapshot,
            saved_before,
        })
    }

    /// True when nothing has been saved for this user yet.
    pub fn is_new(&self) -> bool {
        !self.saved_before
    }

    /// Replaces the log with three sample workouts ending at `now`.
    pub fn seed_demo_workouts(&mut self, now: OffsetDateTime) -> Persisted<()> {
        let demo = [
            ("Running", 30, 320, "Morning run", 0),
            ("Strength Training", 45, 280, "Upper body", 1),
            ("Yoga", 60, 180, "Relaxing flow", 2),
        ];
        self.snapshot.workouts = demo
            .into_iter()
            .map(|(kind, duration, calories, notes, days_ago)| Workout {
                id: Uuid::new_v4(),
                date: now - Duration::days(days_ago),
                kind: kind.to_string(),
                duration,
                calories,
                notes: notes.to_string(),
            })
            .collect();
        info!(user_id = self.user_id, "demo workouts seeded");
        Persisted::from_write((), self.save(now))
    }

    #[instrument(skip(self, new), fields(user_id = self.user_id))]
    pub fn log_workout(&mut self, new: NewWorkout) -> Result<Persisted<Workout>, WorkoutError> {
        let kind = new.kind.trim();
        if kind.is_empty() {
            warn!("workout without type");
            return Err(WorkoutError::MissingType);
        }
        if new.duration == 0 {
            warn!("workout without duration");
            return Err(WorkoutError::InvalidDuration);
        }

        let workout = Workout {
            id: Uuid::new_v4(),
            date: new.date,
            kind: kind.to_string(),
            duration: new.duration,
            calories: new.calories,
            notes: new.notes.trim().to_string(),
        };
        let workouts = &mut self.snapshot.workouts;
        let pos = workouts
            .iter()
            .position(|w| w.date <= workout.date)
            .unwrap_or(workouts.len());
        workouts.insert(pos, workout.clone());

        info!(workout_id = %workout.id, kind = %workout.kind, "workout logged");
        let write = self.save(OffsetDateTime::now_utc());
        Ok(Persisted::from_write(workout, write))
    }

    /// Removes a workout; `false` (and no write) if the id is unknown.
    pub fn remove_workout(&mut self, id: Uuid) -> Persisted<bool> {
        let before = self.snapshot.workouts.len();
        self.snapshot.workouts.retain(|w| w.id != id);
        if self.snapshot.workouts.len() == before {
            return Persisted::from_write(false, Ok(()));
        }
        info!(user_id = self.user_id, workout_id = %id, "workout removed");
        let write = self.save(OffsetDateTime::now_utc());
        Persisted::from_write(true, write)
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.snapshot.workouts
    }

    pub fn recent(&self, n: usize) -> &[Workout] {
        let workouts = &self.snapshot.workouts;
        &workouts[..n.min(workouts.len())]
    }

    pub fn stats(&self, today: Date, offset: UtcOffset) -> DashboardStats {
        let workouts = &self.snapshot.workouts;
        DashboardStats {
            total_workouts: workouts.len(),
            calories_burned: workouts.iter().map(|w| u64::from(w.calories)).sum(),
            active_minutes: workouts.iter().map(|w| u64::from(w.duration)).sum(),
            current_streak: current_streak(workouts, today, offset),
        }
    }

    /// Calories per day of the week containing `today`, Monday first.
    pub fn weekly_calories(&self, today: Date, offset: UtcOffset) -> [u64; 7] {
        let monday = today - Duration::days(i64::from(today.weekday().number_days_from_monday()));
        let mut week = [0u64; 7];
        for w in &self.snapshot.workouts {
            let idx = (w.date.to_offset(offset).date() - monday).whole_days();
            if (0..7).contains(&idx) {
                week[idx as usize] += u64::from(w.calories);
            }
        }
        week
    }

    /// Workout types by share of all workouts, most frequent first.
    pub fn distribution(&self) -> Vec<TypeShare> {
        let total = self.snapshot.workouts.len();
        if total == 0 {
            return Vec::new();
        }
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for w in &self.snapshot.workouts {
            *counts.entry(w.kind.as_str()).or_default() += 1;
        }
        let mut shares: Vec<TypeShare> = counts
            .into_iter()
            .map(|(kind, count)| TypeShare {
                kind: kind.to_string(),
                count,
                percent: ((count * 100 + total / 2) / total) as u32,
            })
            .collect();
        shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.kind.cmp(&b.kind)));
        shares
    }

    fn save(&mut self, now: OffsetDateTime) -> Result<(), StorageError> {
        self.snapshot.last_updated = Some(now);
        save_dashboard(&self.store, self.user_id, &self.snapshot)?;
        self.saved_before = true;
        Ok(())
    }
}

/// Consecutive days with at least one workout, ending today or, if nothing
/// was logged today yet, yesterday.
fn current_streak(workouts: &[Workout], today: Date, offset: UtcOffset) -> u32 {
    let days: BTreeSet<Date> = workouts
        .iter()
        .map(|w| w.date.to_offset(offset).date())
        .collect();

    let mut day = if days.contains(&today) {
        today
    } else {
        match today.previous_day() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        match day.previous_day() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

/// "Just now", "5 minutes ago", "1 hour ago", "3 days ago".
pub fn relative_time(then: OffsetDateTime, now: OffsetDateTime) -> String {
    let diff = now - then;
    let (n, unit) = if diff.whole_days() > 0 {
        (diff.whole_days(), "day")
    } else if diff.whole_hours() > 0 {
        (diff.whole_hours(), "hour")
    } else if diff.whole_minutes() > 0 {
        (diff.whole_minutes(), "minute")
    } else {
        return "Just now".to_string();
    };
    let plural = if n > 1 { "s" } else { "" };
    format!("{n} {unit}{plural} ago")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::rc::Rc;
    use time::macros::{date, datetime, offset};

    fn log() -> (JsonStore, WorkoutLog) {
        let json = JsonStore::new(Rc::new(MemoryStore::new()), "fittrack_");
        let log = WorkoutLog::load(json.clone(), 42).expect("load");
        (json, log)
    }

    fn new_workout(kind: &str, date: OffsetDateTime, calories: u32) -> NewWorkout {
        NewWorkout {
            kind: kind.into(),
            date,
            duration: 30,
            calories,
            notes: String::new(),
        }
    }

    #[test]
    fn fresh_user_gets_demo_workouts() {
        let (json, mut log) = log();
        assert!(log.is_new());

        let now = datetime!(2024-05-10 07:00 UTC);
        assert!(log.seed_demo_workouts(now).is_persisted());
        assert_eq!(log.workouts().len(), 3);
        assert_eq!(log.workouts()[0].kind, "Running");
        assert_eq!(log.workouts()[2].date, datetime!(2024-05-08 07:00 UTC));

        let reloaded = WorkoutLog::load(json, 42).unwrap();
        assert!(!reloaded.is_new());
        assert_eq!(reloaded.workouts(), log.workouts());
    }

    #[test]
    fn logs_keep_newest_first() {
        let (_, mut log) = log();
        let _ = log.log_workout(new_workout("Yoga", datetime!(2024-05-01 07:00 UTC), 100)).unwrap();
        let _ = log.log_workout(new_workout("Run", datetime!(2024-05-03 07:00 UTC), 300)).unwrap();
        let _ = log.log_workout(new_workout("Swim", datetime!(2024-05-02 07:00 UTC), 200)).unwrap();

        let kinds: Vec<&str> = log.workouts().iter().map(|w| w.kind.as_str()).collect();
        assert_eq!(kinds, ["Run", "Swim", "Yoga"]);
        assert_eq!(log.recent(2).len(), 2);
        assert_eq!(log.recent(10).len(), 3);
    }

    #[test]
    fn rejects_incomplete_workouts() {
        let (_, mut log) = log();
        let mut w = new_workout("  ", datetime!(2024-05-01 07:00 UTC), 100);
        assert_eq!(log.log_workout(w.clone()).unwrap_err(), WorkoutError::MissingType);
        w.kind = "Run".into();
        w.duration = 0;
        assert_eq!(log.log_workout(w).unwrap_err(), WorkoutError::InvalidDuration);
        assert!(log.workouts().is_empty());
    }

    #[test]
    fn remove_unknown_id_is_a_noop() {
        let (_, mut log) = log();
        let w = log
            .log_workout(new_workout("Run", datetime!(2024-05-01 07:00 UTC), 100))
            .unwrap()
            .into_value();
        assert!(!log.remove_workout(Uuid::new_v4()).value);
        assert!(log.remove_workout(w.id).value);
        assert!(log.workouts().is_empty());
    }

    #[test]
    fn stats_and_streak() {
        let (_, mut log) = log();
        for (day, cal) in [(9, 100), (8, 200), (7, 300), (4, 50)] {
            let date = datetime!(2024-05-01 12:00 UTC) + Duration::days(day - 1);
            let _ = log.log_workout(new_workout("Run", date, cal)).unwrap();
        }
        let stats = log.stats(date!(2024-05-10), offset!(UTC));
        assert_eq!(stats.total_workouts, 4);
        assert_eq!(stats.calories_burned, 650);
        assert_eq!(stats.active_minutes, 120);
        // nothing on the 10th yet, so the streak runs 9, 8, 7
        assert_eq!(stats.current_streak, 3);

        assert_eq!(log.stats(date!(2024-05-12), offset!(UTC)).current_streak, 0);
    }

    #[test]
    fn streak_respects_utc_offset() {
        let (_, mut log) = log();
        // 23:30 UTC on the 9th is already the 10th at +02:00
        let _ = log.log_workout(new_workout("Run", datetime!(2024-05-09 23:30 UTC), 100)).unwrap();
        assert_eq!(log.stats(date!(2024-05-10), offset!(+2)).current_streak, 1);
        assert_eq!(
            log.weekly_calories(date!(2024-05-10), offset!(+2)),
            [0, 0, 0, 0, 100, 0, 0]
        );
    }

    #[test]
    fn weekly_calories_cover_current_week_only() {
        let (_, mut log) = log();
        // 2024-05-06 is a Monday
        let _ = log.log_workout(new_workout("Run", datetime!(2024-05-06 08:00 UTC), 320)).unwrap();
        let _ = log.log_workout(new_workout("Run", datetime!(2024-05-06 18:00 UTC), 80)).unwrap();
        let _ = log.log_workout(new_workout("Yoga", datetime!(2024-05-12 08:00 UTC), 180)).unwrap();
        let _ = log.log_workout(new_workout("Yoga", datetime!(2024-05-05 08:00 UTC), 999)).unwrap();

        let week = log.weekly_calories(date!(2024-05-08), offset!(UTC));
        assert_eq!(week, [400, 0, 0, 0, 0, 0, 180]);
    }

    #[test]
    fn weekly_calories_do_not_overflow() {
        let (_, mut log) = log();
        for hour in [6, 12, 18] {
            let at = datetime!(2024-05-06 00:00 UTC) + Duration::hours(hour);
            let _ = log.log_workout(new_workout("Ultra", at, u32::MAX)).unwrap();
        }
        let week = log.weekly_calories(date!(2024-05-06), offset!(UTC));
        assert_eq!(week[0], 3 * u64::from(u32::MAX));
    }

    #[test]
    fn reads_browser_client_blob() {
        let backend = Rc::new(MemoryStore::new());
        let json = JsonStore::new(backend.clone(), "fittrack_");
        backend
            .set(
                "fittrack_dashboard_42",
                r#"{"workouts":[{"id":1,"date":"2024-05-10T07:00:00.000Z","type":"Running","duration":30,"calories":320,"notes":"Morning run"},{"id":1715324712000,"date":"2024-05-09T07:00:00.000Z","type":"Yoga","duration":60,"calories":180}],"stats":{"totalWorkouts":42,"caloriesBurned":8540,"activeMinutes":1260,"currentStreak":7},"lastUpdated":"2024-05-10T07:00:00.000Z"}"#,
            )
            .unwrap();

        let mut log = WorkoutLog::load(json.clone(), 42).unwrap();
        assert!(!log.is_new());
        assert_eq!(log.workouts().len(), 2);
        assert_eq!(log.workouts()[0].id, Uuid::from_u128(1));
        assert_eq!(log.workouts()[1].notes, "");
        assert_eq!(log.stats(date!(2024-05-10), offset!(UTC)).calories_burned, 500);

        assert!(log.remove_workout(Uuid::from_u128(1)).is_persisted());
        let reloaded = WorkoutLog::load(json, 42).unwrap();
        assert_eq!(reloaded.workouts().len(), 1);
        assert_eq!(reloaded.workouts()[0].kind, "Yoga");
    }

    #[test]
    fn unreadable_blob_starts_empty_without_demo_data() {
        let backend = Rc::new(MemoryStore::new());
        let json = JsonStore::new(backend.clone(), "fittrack_");
        backend.set("fittrack_dashboard_42", r#"{"workouts":"oops"}"#).unwrap();

        let mut log = WorkoutLog::load(json.clone(), 42).unwrap();
        assert!(log.workouts().is_empty());
        assert!(!log.is_new());

        let logged = log.log_workout(new_workout("Run", datetime!(2024-05-10 07:00 UTC), 300)).unwrap();
        assert!(logged.is_persisted());
        assert_eq!(WorkoutLog::load(json, 42).unwrap().workouts().len(), 1);
    }

    #[test]
    fn distribution_orders_by_count() {
        let (_, mut log) = log();
        let at = datetime!(2024-05-01 08:00 UTC);
        for kind in ["Running", "Running", "Yoga", "Cycling"] {
            let _ = log.log_workout(new_workout(kind, at, 100)).unwrap();
        }
        let shares = log.distribution();
        assert_eq!(shares[0].kind, "Running");
        assert_eq!(shares[0].percent, 50);
        assert_eq!(shares[1].kind, "Cycling");
        assert_eq!(shares[1].percent, 25);
        assert_eq!(shares.len(), 3);
    }

    #[test]
    fn relative_time_wording() {
        let now = datetime!(2024-05-10 12:00 UTC);
        assert_eq!(relative_time(now - Duration::seconds(30), now), "Just now");
        assert_eq!(relative_time(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_time(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(relative_time(now - Duration::days(1), now), "1 day ago");
        assert_eq!(relative_time(now - Duration::days(12), now), "12 days ago");
    }
}
