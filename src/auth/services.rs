use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::auth::dto::{AuthStatus, PublicUser};
use crate::auth::password::{hash_password, verify_password, Verification};
use crate::auth::repo::AccountDirectory;
use crate::auth::repo_types::UserRecord;
use crate::auth::session::SessionHolder;
use crate::auth::validation::{credentials_present, validate_registration, ValidationError};
use crate::storage::{JsonStore, Persisted};

pub const DEMO_NAME: &str = "Pro Athlete";
pub const DEMO_EMAIL: &str = "athlete@fittrack.com";
pub const DEMO_PASSWORD: &str = "FitPro2024";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("This email is already registered. Please login instead.")]
    DuplicateEmail,
    #[error("Email and password are required")]
    MissingCredential,
    #[error("No account found with this email. Please sign up first.")]
    AccountNotFound,
    #[error("Incorrect password. Please try again.")]
    IncorrectPassword,
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

/// Registration, login and logout over the account directory and the
/// session holder.
pub struct AuthService {
    directory: AccountDirectory,
    session: SessionHolder,
    users_readable: bool,
}

impl AuthService {
    /// Loads users and the saved session. Never fails: unreadable blobs are
    /// logged and replaced by empty state.
    pub fn load(store: JsonStore) -> Self {
        let (directory, users_readable) = match AccountDirectory::load(store.clone()) {
            Ok(d) => (d, true),
            Err(e) => {
                error!(error = %e, "could not load users; starting with an empty directory");
                (AccountDirectory::empty(store.clone()), false)
            }
        };
        let session = SessionHolder::load(store.clone()).unwrap_or_else(|e| {
            error!(error = %e, "could not restore session; starting signed out");
            SessionHolder::signed_out(store)
        });
        info!(
            users = directory.len(),
            logged_in = session.is_logged_in(),
            "auth state loaded"
        );
        Self {
            directory,
            session,
            users_readable,
        }
    }

    /// Registers the demo account when the directory is empty. Failures are
    /// logged only. Skipped when the stored users could not be read, so the
    /// unreadable blob is not overwritten.
    pub fn seed_demo_account(&mut self) -> Option<UserRecord> {
        if !self.users_readable {
            warn!("stored users unreadable; not seeding demo account");
            return None;
        }
        if !self.directory.is_empty() {
            return None;
        }
        match self.register(DEMO_NAME, DEMO_EMAIL, DEMO_PASSWORD) {
            Ok(outcome) => {
                if let Some(e) = &outcome.persist_error {
                    warn!(error = %e, "demo account created but not saved");
                }
                info!(email = DEMO_EMAIL, "demo account created");
                Some(outcome.into_value())
            }
            Err(e) => {
                warn!(error = %e, "demo account creation failed");
                None
            }
        }
    }

    #[instrument(skip(self, name, email, password), fields(email = %email.trim()))]
    pub fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Persisted<UserRecord>, AuthError> {
        if let Err(e) = validate_registration(name, email, password) {
            warn!(reason = ?e, "registration rejected");
            return Err(e.into());
        }

        let email = email.trim().to_lowercase();
        if self.directory.find_by_email(&email).is_some() {
            warn!(%email, "email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let password = hash_password(password).map_err(|e| {
            error!(error = %e, "hash_password failed");
            AuthError::PasswordHash(e.to_string())
        })?;

        let now = OffsetDateTime::now_utc();
        let user = UserRecord {
            id: self.directory.next_id(now),
            name: name.trim().to_string(),
            email,
            password,
            created_at: now,
            login_count: 0,
            last_login: None,
        };

        let outcome = self.directory.insert(user);
        info!(user_id = outcome.value.id, persisted = outcome.is_persisted(), "user registered");
        Ok(outcome)
    }

    #[instrument(skip(self, email, password), fields(email = %email.trim()))]
    pub fn login(&mut self, email: &str, password: &str) -> Result<Persisted<UserRecord>, AuthError> {
        if !credentials_present(email, password) {
            warn!("login with blank credentials");
            return Err(AuthError::MissingCredential);
        }

        let snapshot = {
            let user = match self.directory.find_by_email_mut(email) {
                Some(u) => u,
                None => {
                    warn!("login unknown email");
                    return Err(AuthError::AccountNotFound);
                }
            };

            match verify_password(password, &user.password) {
                Verification::Match => {}
                Verification::LegacyMatch => match hash_password(password) {
                    Ok(hash) => {
                        info!(user_id = user.id, "upgraded legacy password encoding");
                        user.password = hash;
                    }
                    Err(e) => warn!(error = %e, user_id = user.id, "keeping legacy password encoding"),
                },
                Verification::Mismatch => {
                    warn!(user_id = user.id, "login invalid password");
                    return Err(AuthError::IncorrectPassword);
                }
            }

            let now = OffsetDateTime::now_utc();
            user.login_count += 1;
            user.last_login = Some(user.last_login.map_or(now, |prev| prev.max(now)));
            user.clone()
        };

        let directory_write = self.directory.save();
        let session = self.session.start(snapshot.clone());
        let persist_error = match (directory_write, session.persist_error) {
            (Ok(()), session_error) => session_error,
            (Err(e), None) => Some(e),
            (Err(e), Some(session_error)) => {
                warn!(error = %session_error, user_id = snapshot.id, "session not saved either");
                Some(e)
            }
        };

        info!(
            user_id = snapshot.id,
            login_count = snapshot.login_count,
            persisted = persist_error.is_none(),
            "user logged in"
        );
        Ok(Persisted {
            value: snapshot,
            persist_error,
        })
    }

    pub fn logout(&mut self) -> Persisted<()> {
        if let Some(user) = self.session.current_user() {
            info!(user_id = user.id, "user logged out");
        }
        self.session.clear()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub fn current_user(&self) -> Option<&UserRecord> {
        self.session.current_user()
    }

    pub fn directory(&self) -> &AccountDirectory {
        &self.directory
    }

    pub fn status(&self) -> AuthStatus {
        AuthStatus {
            total_users: self.directory.len(),
            current_user: self.current_user().map(PublicUser::from),
        }
    }
}
