use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

mod data;
pub use data::*;

mod sqlite;
pub use sqlite::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;
pub type SharedDatabase = Arc<dyn Database>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    /// Turns a uniqueness violation into a conflict error
    fn conflict_or(self, resource: &'static str, field: &'static str, value: &str)
        -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(DatabaseError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Represents a type that can fetch campusguessr data from a database
#[async_trait]
pub trait Database: Send + Sync {
    async fn user_by_username(&self, username: &str) -> Result<UserData>;
    /// Every user row matching the username. Callers decide what "exactly one" means.
    async fn users_by_username(&self, username: &str) -> Result<Vec<UserData>>;
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;

    async fn session_by_token(&self, token: &str) -> Result<SessionData>;
    async fn create_session(&self, new_session: NewSession) -> Result<SessionData>;
    async fn delete_session_by_token(&self, token: &str) -> Result<()>;
    async fn clear_expired_sessions(&self) -> Result<()>;

    async fn list_photos(&self) -> Result<Vec<PhotoData>>;

    async fn create_score(&self, new_score: NewScore) -> Result<ScoreData>;
    async fn list_scores(&self) -> Result<Vec<ScoreData>>;
    /// Each user's best score, highest first. Ties are ordered by username.
    async fn high_scores(&self) -> Result<Vec<HighScoreData>>;
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    /// Already hashed by the time it reaches the database
    pub password: String,
}

#[derive(Debug)]
pub struct NewSession {
    pub token: String,
    pub user_id: PrimaryKey,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewScore {
    pub username: String,
    pub score: i64,
}
