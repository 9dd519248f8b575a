use serde::Serialize;
use time::OffsetDateTime;

use crate::auth::repo_types::UserRecord;

/// Public part of the user handed to the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub login_count: u32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
}

impl From<&UserRecord> for PublicUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            login_count: user.login_count,
            last_login: user.last_login,
        }
    }
}

/// Snapshot of the auth layer for status displays.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub total_users: usize,
    pub current_user: Option<PublicUser>,
}
