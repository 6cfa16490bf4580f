mod auth;
mod db;
mod leaderboard;
mod rounds;
mod util;

use std::sync::Arc;

use chrono::Duration;

pub use auth::*;
pub use db::*;
pub use leaderboard::*;
pub use rounds::*;
pub use util::random_string;

/// The campusguessr game, facilitating accounts, rounds and the leaderboard.
pub struct Game {
    database: SharedDatabase,

    pub auth: Auth,
    pub leaderboard: Leaderboard,
    pub rounds: Rounds,
}

impl Game {
    pub fn new<Db>(database: Db, session_duration: Duration) -> Self
    where
        Db: Database + 'static,
    {
        let database: SharedDatabase = Arc::new(database);

        Self {
            auth: Auth::new(&database, session_duration),
            leaderboard: Leaderboard::new(&database),
            rounds: Rounds::new(&database),
            database,
        }
    }

    /// Direct access to the underlying database
    pub fn database(&self) -> &SharedDatabase {
        &self.database
    }
}
