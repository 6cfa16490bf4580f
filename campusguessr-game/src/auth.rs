use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use log::{info, warn};
use rand::rngs::OsRng;
use thiserror::Error;

use crate::{
    util::random_string, DatabaseError, NewSession, NewUser, SessionData, SharedDatabase,
    UserData,
};

pub struct Auth {
    db: SharedDatabase,
    argon: Argon2<'static>,
    session_duration: Duration,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("You must enter a username!")]
    MissingUsername,
    #[error("Username taken!")]
    UsernameTaken,
    #[error("You must enter a password!")]
    MissingPassword,
    #[error("Passwords do not match!")]
    PasswordMismatch,
    /// Username or password is incorrect, deliberately not saying which
    #[error("Username and password do not match!")]
    InvalidCredentials,
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
    /// The configured session duration can't be added to the current time
    #[error("Session duration of {0} is out of range")]
    SessionDuration(Duration),
}

impl AuthError {
    /// Returns true if the error is caused by what the user typed in
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::Db(_) | Self::HashError(_) | Self::SessionDuration(_)
        )
    }
}

impl Auth {
    pub const SESSION_DURATION_IN_DAYS: i64 = 7;

    pub fn new(db: &SharedDatabase, session_duration: Duration) -> Self {
        Self {
            db: db.clone(),
            argon: Argon2::default(),
            session_duration,
        }
    }

    /// Validates a registration and creates the user.
    /// Checks run in a fixed order and the first failure is returned.
    pub async fn register(&self, registration: Registration) -> Result<UserData, AuthError> {
        let username = registration.username.unwrap_or_default();
        if username.is_empty() {
            return Err(AuthError::MissingUsername);
        }

        let existing = self
            .db
            .users_by_username(&username)
            .await
            .map_err(AuthError::Db)?;

        if !existing.is_empty() {
            return Err(AuthError::UsernameTaken);
        }

        let password = registration.password.unwrap_or_default();
        if password.is_empty() {
            return Err(AuthError::MissingPassword);
        }

        if registration.confirmation.as_deref() != Some(password.as_str()) {
            return Err(AuthError::PasswordMismatch);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = self
            .argon
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let user = self
            .db
            .create_user(NewUser {
                username,
                password: hashed_password,
            })
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict { .. } => AuthError::UsernameTaken,
                e => AuthError::Db(e),
            })?;

        info!("Registered user {}", user.username);
        Ok(user)
    }

    /// Logs in a user, returning a new session
    pub async fn login(&self, credentials: Credentials) -> Result<SessionData, AuthError> {
        let username = credentials.username.unwrap_or_default();
        if username.is_empty() {
            return Err(AuthError::MissingUsername);
        }

        let password = credentials.password.unwrap_or_default();
        if password.is_empty() {
            return Err(AuthError::MissingPassword);
        }

        if let Err(e) = self.db.clear_expired_sessions().await {
            warn!("Could not clear expired sessions: {}", e);
        }

        let users = self
            .db
            .users_by_username(&username)
            .await
            .map_err(AuthError::Db)?;

        let [user] = users.as_slice() else {
            return Err(AuthError::InvalidCredentials);
        };

        // A hash that can't be parsed can't match either
        let stored_password = PasswordHash::parse(&user.password, Encoding::default())
            .map_err(|_| AuthError::InvalidCredentials)?;

        self.argon
            .verify_password(password.as_bytes(), &stored_password)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let expires_at = Utc::now()
            .checked_add_signed(self.session_duration)
            .ok_or(AuthError::SessionDuration(self.session_duration))?;

        let new_session = NewSession {
            token: random_string(32),
            user_id: user.id,
            expires_at,
        };

        let session = self
            .db
            .create_session(new_session)
            .await
            .map_err(AuthError::Db)?;

        info!("{} logged in", session.user.username);
        Ok(session)
    }

    /// Deletes the associated session, if it exists
    pub async fn logout(&self, token: &str) -> Result<(), DatabaseError> {
        match self.db.delete_session_by_token(token).await {
            Err(DatabaseError::NotFound { .. }) => Ok(()),
            result => result,
        }
    }

    /// Returns a session if it exists and hasn't expired
    pub async fn session(&self, token: &str) -> Result<SessionData, DatabaseError> {
        self.db.session_by_token(token).await
    }

    /// Removes every session past its expiry
    pub async fn clear_expired(&self) -> Result<(), DatabaseError> {
        self.db.clear_expired_sessions().await
    }
}

/// A registration form as submitted, fields may be missing
#[derive(Debug, Default)]
pub struct Registration {
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirmation: Option<String>,
}

/// A login form as submitted, fields may be missing
#[derive(Debug, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}
