use std::{env, fmt};

use campusguessr_game::{random_string, Auth};
use log::{info, warn};
use thiserror::Error;

/// Server configuration, read once at startup and constant for the lifetime of the process
#[derive(Clone)]
pub struct Config {
    /// The port the server will listen on
    pub port: u16,
    /// Where the SQLite database lives
    pub database_url: String,
    /// Key used to sign session cookies.
    /// If it isn't configured, a new one is generated on every start,
    /// which invalidates every session handed out by a previous process.
    pub session_secret: String,
    /// How long a login lasts
    pub session_duration_in_days: i64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl Config {
    /// The default port the server will listen on.
    pub const DEFAULT_PORT: u16 = 9050;
    pub const DEFAULT_DATABASE_URL: &'static str = "sqlite://campusguessr.db";

    const PORT_KEY: &'static str = "CAMPUSGUESSR_SERVER_PORT";
    const DATABASE_URL_KEY: &'static str = "DATABASE_URL";
    const SESSION_SECRET_KEY: &'static str = "CAMPUSGUESSR_SESSION_SECRET";
    const SESSION_DAYS_KEY: &'static str = "CAMPUSGUESSR_SESSION_DAYS";

    /// Longest allowed session, roughly a century
    pub const MAX_SESSION_DAYS: i64 = 36_500;

    /// Loads the configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(Self::PORT_KEY) {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: Self::PORT_KEY,
                expected: "a port number",
                value,
            })?,
            None => Self::DEFAULT_PORT,
        };

        let database_url = lookup(Self::DATABASE_URL_KEY).unwrap_or_else(|| {
            info!(
                "{} not set, using default: {}",
                Self::DATABASE_URL_KEY,
                Self::DEFAULT_DATABASE_URL
            );
            Self::DEFAULT_DATABASE_URL.to_string()
        });

        let session_secret = match lookup(Self::SESSION_SECRET_KEY) {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!(
                    "{} not set, generated a new one. Sessions will not survive a restart.",
                    Self::SESSION_SECRET_KEY
                );
                random_string(64)
            }
        };

        let session_duration_in_days = match lookup(Self::SESSION_DAYS_KEY) {
            Some(value) => match value.parse::<i64>() {
                Ok(days) if (1..=Self::MAX_SESSION_DAYS).contains(&days) => days,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: Self::SESSION_DAYS_KEY,
                        expected: "a number of days between 1 and 36500",
                        value,
                    })
                }
            },
            None => Auth::SESSION_DURATION_IN_DAYS,
        };

        Ok(Self {
            port,
            database_url,
            session_secret,
            session_duration_in_days,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("session_secret", &"<redacted>")
            .field("session_duration_in_days", &self.session_duration_in_days)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::{Config, ConfigError};

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<_, _> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_are_used_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.port, Config::DEFAULT_PORT);
        assert_eq!(config.database_url, Config::DEFAULT_DATABASE_URL);
        assert_eq!(config.session_duration_in_days, 7);
        assert_eq!(config.session_secret.len(), 64);
    }

    #[test]
    fn generated_secrets_differ_between_starts() {
        let first = config_from(&[]).unwrap();
        let second = config_from(&[]).unwrap();

        assert_ne!(first.session_secret, second.session_secret);
    }

    #[test]
    fn configured_values_are_used() {
        let config = config_from(&[
            ("CAMPUSGUESSR_SERVER_PORT", "8080"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("CAMPUSGUESSR_SESSION_SECRET", "correct horse battery staple"),
            ("CAMPUSGUESSR_SESSION_DAYS", "30"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.session_secret, "correct horse battery staple");
        assert_eq!(config.session_duration_in_days, 30);
        assert!(!format!("{:?}", config).contains("horse"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config_from(&[("CAMPUSGUESSR_SERVER_PORT", "ninety")]).is_err());
        assert!(config_from(&[("CAMPUSGUESSR_SESSION_DAYS", "0")]).is_err());
        assert!(config_from(&[("CAMPUSGUESSR_SESSION_DAYS", "-2")]).is_err());
    }

    #[test]
    fn session_length_is_bounded() {
        let longest = Config::MAX_SESSION_DAYS.to_string();
        let config = config_from(&[("CAMPUSGUESSR_SESSION_DAYS", &longest)]).unwrap();
        assert_eq!(config.session_duration_in_days, Config::MAX_SESSION_DAYS);

        for days in ["36501", "1000000000", "999999999999"] {
            let result = config_from(&[("CAMPUSGUESSR_SESSION_DAYS", days)]);
            assert!(matches!(result, Err(ConfigError::Invalid { .. })));
        }
    }
}
