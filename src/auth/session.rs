use tracing::debug;

use crate::auth::repo_types::UserRecord;
use crate::storage::{JsonStore, Persisted, StorageError};

pub const CURRENT_USER_KEY: &str = "current_user";

/// The one signed-in user, if any. Holds a copy of the directory record;
/// the two are updated independently.
pub struct SessionHolder {
    store: JsonStore,
    current: Option<UserRecord>,
}

impl SessionHolder {
    /// Restores a saved session. Sessions never expire.
    pub fn load(store: JsonStore) -> Result<Self, StorageError> {
        let current: Option<UserRecord> = store.get(CURRENT_USER_KEY)?;
        debug!(restored = current.is_some(), "session loaded");
        Ok(Self { store, current })
    }

    pub fn signed_out(store: JsonStore) -> Self {
        Self { store, current: None }
    }

    pub fn current_user(&self) -> Option<&UserRecord> {
        self.current.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    pub(crate) fn start(&mut self, user: UserRecord) -> Persisted<()> {
        let write = self.store.set(CURRENT_USER_KEY, &user);
        self.current = Some(user);
        Persisted::from_write((), write)
    }

    pub(crate) fn clear(&mut self) -> Persisted<()> {
        self.current = None;
        Persisted::from_write((), self.store.remove(CURRENT_USER_KEY))
    }
}
