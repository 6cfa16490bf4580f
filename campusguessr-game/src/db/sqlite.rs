use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use sqlx::{
    query, query_as,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError, FromRow, SqlitePool,
};
use std::str::FromStr;

use crate::{
    Database, DatabaseError, DatabaseResult, HighScoreData, IntoDatabaseError, NewScore,
    NewSession, NewUser, PhotoData, PrimaryKey, Result, ScoreData, SessionData, UserData,
};

/// The tables campusguessr needs, created on connect if they don't exist yet.
const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        hash TEXT NOT NULL
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS photos (
        filename TEXT PRIMARY KEY, -- <integer>.jpg
        latitude REAL NOT NULL,
        longitude REAL NOT NULL
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS leaderboard (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL,
        score INTEGER NOT NULL,
        created_at INTEGER NOT NULL DEFAULT (unixepoch())
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY,
        token TEXT NOT NULL UNIQUE,
        user_id INTEGER NOT NULL REFERENCES users (id),
        expires_at INTEGER NOT NULL -- Unix timestamp
    )"#,
];

/// A SQLite database implementation for campusguessr
pub struct SqliteDatabase {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct SessionRow {
    id: PrimaryKey,
    token: String,
    expires_at: i64,
    user_id: PrimaryKey,
    username: String,
    hash: String,
}

impl SqliteDatabase {
    /// Connects to the database at `url`, creating the file and the tables if needed.
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| e.any())?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(5);

        // Every connection to :memory: is its own database, so keep exactly one alive
        if url.contains(":memory:") {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| e.any())?;

        let database = Self { pool };
        database.create_tables().await?;

        Ok(database)
    }

    /// Creates a fresh, private in-memory database
    pub async fn in_memory() -> Result<Self> {
        Self::new("sqlite::memory:").await
    }

    /// Inserts a photo. Photos are normally loaded out-of-band, this is used for seeding.
    pub async fn create_photo(&self, photo: &PhotoData) -> Result<()> {
        query("INSERT INTO photos (filename, latitude, longitude) VALUES (?, ?, ?)")
            .bind(&photo.filename)
            .bind(photo.latitude)
            .bind(photo.longitude)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn create_tables(&self) -> Result<()> {
        for statement in SCHEMA {
            query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| e.any())?;
        }

        info!("Database schema is ready");
        Ok(())
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        query_as::<_, UserData>("SELECT id, username, hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "username"))
    }

    async fn users_by_username(&self, username: &str) -> Result<Vec<UserData>> {
        query_as::<_, UserData>("SELECT id, username, hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        // The UNIQUE constraint decides, so concurrent registrations can't both win
        query_as::<_, UserData>(
            "INSERT INTO users (username, hash) VALUES (?, ?) RETURNING id, username, hash",
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.conflict_or("user", "username", &new_user.username))
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let row = query_as::<_, SessionRow>(
            "SELECT
                sessions.id,
                sessions.token,
                sessions.expires_at,
                sessions.user_id,
                users.username,
                users.hash
            FROM sessions
                INNER JOIN users ON sessions.user_id = users.id
            WHERE token = ? AND expires_at > ?",
        )
        .bind(token)
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("session", "token"))?;

        Ok(SessionData {
            id: row.id,
            token: row.token,
            expires_at: DateTime::<Utc>::from_timestamp(row.expires_at, 0).unwrap_or_default(),
            user: UserData {
                id: row.user_id,
                username: row.username,
                password: row.hash,
            },
        })
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        self.session_by_token(&new_session.token)
            .await
            .conflict_or_ok("session", "token", &new_session.token)?;

        query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(&new_session.token)
            .bind(new_session.user_id)
            .bind(new_session.expires_at.timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.session_by_token(&new_session.token).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        let result = query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            });
        }

        Ok(())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn list_photos(&self) -> Result<Vec<PhotoData>> {
        query_as::<_, PhotoData>("SELECT filename, latitude, longitude FROM photos")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_score(&self, new_score: NewScore) -> Result<ScoreData> {
        query_as::<_, ScoreData>(
            "INSERT INTO leaderboard (username, score) VALUES (?, ?)
            RETURNING id, username, score, created_at",
        )
        .bind(&new_score.username)
        .bind(new_score.score)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn list_scores(&self) -> Result<Vec<ScoreData>> {
        query_as::<_, ScoreData>(
            "SELECT id, username, score, created_at FROM leaderboard ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn high_scores(&self) -> Result<Vec<HighScoreData>> {
        query_as::<_, HighScoreData>(
            "SELECT username, MAX(score) AS max_score
            FROM leaderboard
            GROUP BY username
            ORDER BY max_score DESC, username ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }

    fn conflict_or(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> DatabaseError {
        match self {
            SqlxError::Database(e) if e.is_unique_violation() => DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            },
            e => Self::any(e),
        }
    }
}
