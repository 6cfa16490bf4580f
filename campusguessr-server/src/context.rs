use std::sync::Arc;

use campusguessr_game::Game;

use crate::{config::Config, cookies::CookieSigner};

/// Passed to every handler. Holds nothing request specific, the identity of
/// the caller comes from the [Session](crate::auth::Session) extractor.
#[derive(Clone)]
pub struct ServerContext {
    pub game: Arc<Game>,
    pub config: Arc<Config>,
    pub cookies: CookieSigner,
}

impl ServerContext {
    pub fn new(game: Game, config: Config) -> Self {
        Self {
            cookies: CookieSigner::new(&config.session_secret),
            game: Arc::new(game),
            config: Arc::new(config),
        }
    }
}
