use campusguessr_game::{DatabaseError, Game, SqliteDatabase};
use campusguessr_server::{run_server, Config, ConfigError, ServerContext};
use chrono::Duration;
use colored::Colorize;
use log::{error, info};
use thiserror::Error;
use tokio::runtime;

mod logging;

#[derive(Debug, Error)]
enum CampusguessrError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl CampusguessrError {
    fn hint(&self) -> String {
        match self {
            Self::Config(_) => "Check the CAMPUSGUESSR_* and DATABASE_URL environment variables, then try again.".to_string(),
            Self::Database(_) => "This is a database error. Make sure DATABASE_URL points to a writable SQLite database, then try again.".to_string(),
            Self::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

async fn start() -> Result<(), CampusguessrError> {
    let config = Config::from_env()?;

    info!("Connecting to database...");
    let database = SqliteDatabase::new(&config.database_url).await?;

    let game = Game::new(database, Duration::days(config.session_duration_in_days));
    game.auth.clear_expired().await?;

    info!("Initialized successfully.");

    run_server(ServerContext::new(game, config))
        .await
        .map_err(|e| CampusguessrError::Fatal(e.to_string()))
}

fn main() {
    logging::init_logger();

    let result = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("campusguessr-async")
        .build()
        .map_err(|e| CampusguessrError::Fatal(e.to_string()))
        .and_then(|runtime| runtime.block_on(start()));

    if let Err(error) = result {
        error!("{} Read the error below to troubleshoot the issue. If you think this might be a bug, please report it by making a GitHub issue.", "campusguessr failed to start!".bold().red());
        error!("{}", error);
        error!(
            "{}",
            format!("Hint: {}", error.hint()).dimmed().italic()
        );
    }
}
