use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// User record as stored under the `users` and `current_user` keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,                      // creation time in ms, bumped to stay unique
    pub name: String,                 // trimmed, non-empty
    pub email: String,                // trimmed, lowercase
    pub password: String,             // Argon2 PHC string, or legacy base64 until next login
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub login_count: u32,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
}

impl UserRecord {
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.to_lowercase() == email.trim().to_lowercase()
    }
}
