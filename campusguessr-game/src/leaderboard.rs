use log::info;

use crate::{DatabaseError, HighScoreData, NewScore, ScoreData, SharedDatabase, UserData};

/// The global leaderboard. Every submission is kept, standings show each user's best.
pub struct Leaderboard {
    db: SharedDatabase,
}

impl Leaderboard {
    pub fn new(db: &SharedDatabase) -> Self {
        Self { db: db.clone() }
    }

    /// Records a score for the user. Scores are taken as-is.
    pub async fn submit(&self, user: &UserData, score: i64) -> Result<ScoreData, DatabaseError> {
        let entry = self
            .db
            .create_score(NewScore {
                username: user.username.clone(),
                score,
            })
            .await?;

        info!("{} submitted a score of {}", entry.username, entry.score);
        Ok(entry)
    }

    /// Each user's maximum score, highest first
    pub async fn standings(&self) -> Result<Vec<HighScoreData>, DatabaseError> {
        self.db.high_scores().await
    }
}
