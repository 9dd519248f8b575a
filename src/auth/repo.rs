use time::OffsetDateTime;
use tracing::{debug, info};

use crate::auth::repo_types::UserRecord;
use crate::storage::{JsonStore, Persisted, StorageError};

pub const USERS_KEY: &str = "users";

/// All registered users, held in memory and written back as one blob.
pub struct AccountDirectory {
    store: JsonStore,
    users: Vec<UserRecord>,
}

impl AccountDirectory {
    /// Loads the `users` blob; a missing key is an empty directory.
    pub fn load(store: JsonStore) -> Result<Self, StorageError> {
        let users: Vec<UserRecord> = store.get(USERS_KEY)?.unwrap_or_default();
        debug!(count = users.len(), "account directory loaded");
        Ok(Self { store, users })
    }

    /// A directory that ignores whatever is stored; used when the stored blob
    /// cannot be read.
    pub fn empty(store: JsonStore) -> Self {
        Self {
            store,
            users: Vec::new(),
        }
    }

    pub fn save(&self) -> Result<(), StorageError> {
        self.store.set(USERS_KEY, &self.users)
    }

    /// Case-insensitive lookup; the first match wins.
    pub fn find_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.email_matches(email))
    }

    pub(crate) fn find_by_email_mut(&mut self, email: &str) -> Option<&mut UserRecord> {
        self.users.iter_mut().find(|u| u.email_matches(email))
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Next id: the current time in milliseconds, or one past the highest
    /// existing id when the clock has not moved on.
    pub(crate) fn next_id(&self, now: OffsetDateTime) -> i64 {
        let millis = (now.unix_timestamp_nanos() / 1_000_000) as i64;
        match self.users.iter().map(|u| u.id).max() {
            Some(max) if max >= millis => max + 1,
            _ => millis,
        }
    }

    /// Appends an already-validated record and writes the whole collection.
    pub(crate) fn insert(&mut self, user: UserRecord) -> Persisted<UserRecord> {
        self.users.push(user.clone());
        info!(user_id = user.id, email = %user.email, total = self.users.len(), "user added");
        Persisted::from_write(user, self.save())
    }
}
