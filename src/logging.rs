use std::{env, fmt::Display};

use colored::Colorize;
use log::{Level, LevelFilter};

/// External crates only need to log warnings and errors
const ALLOWED_EXTERNAL_LEVELS: [Level; 2] = [Level::Warn, Level::Error];
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;
const LEVEL_KEY: &str = "CAMPUSGUESSR_LOG_LEVEL";

/// Parses the verbosity of campusguessr's own logs, such as `debug` or `warn`
fn local_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(DEFAULT_LEVEL)
}

pub fn init_logger() {
    let level = local_level(env::var(LEVEL_KEY).ok().as_deref());

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let target = Target::from_str(record.target());
            let now = chrono::Local::now();

            out.finish(format_args!(
                "{:^5} {} {:^8} {}",
                level_to_string(&record.level()),
                now.format("%H:%M:%S").to_string().bright_black(),
                target,
                message
            ))
        })
        .filter(move |meta| {
            let target = Target::from_str(meta.target());

            if target.is_local() {
                meta.level() <= level
            } else {
                ALLOWED_EXTERNAL_LEVELS.contains(&meta.level())
            }
        })
        .chain(std::io::stdout())
        .apply()
        .expect("logging is initialized")
}

enum Target {
    External(String),
    Main,
    Server,
    Game,
}

impl Target {
    fn from_str(str: &str) -> Self {
        let module = str.split("::").next().unwrap_or_default();

        match module {
            "campusguessr" => Self::Main,
            "campusguessr_server" => Self::Server,
            "campusguessr_game" => Self::Game,
            other => Self::External(other.to_string()),
        }
    }

    fn is_local(&self) -> bool {
        !matches!(self, Self::External(_))
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = match self {
            Target::External(x) => x.as_str().clear(),
            Target::Main => "MAIN".bright_cyan(),
            Target::Server => "SERVER".bright_green(),
            Target::Game => "GAME".bright_purple(),
        };

        Display::fmt(&result, f)
    }
}

fn level_to_string(level: &Level) -> String {
    match level {
        Level::Error => " ERR ".black().on_red().bold().to_string(),
        Level::Warn => " WRN ".black().on_yellow().bold().to_string(),
        Level::Info => " INF ".black().on_blue().bold().to_string(),
        Level::Debug => " DBG ".white().on_black().to_string(),
        Level::Trace => " TRC ".to_string(),
    }
}

#[cfg(test)]
mod test {
    use log::LevelFilter;

    use super::{local_level, Target};

    #[test]
    fn workspace_crates_are_local_targets() {
        assert!(Target::from_str("campusguessr_server::auth").is_local());
        assert!(Target::from_str("campusguessr_game").is_local());
        assert!(Target::from_str("campusguessr").is_local());
        assert!(!Target::from_str("sqlx::query").is_local());
    }

    #[test]
    fn verbosity_can_be_raised_and_lowered() {
        assert_eq!(local_level(None), LevelFilter::Info);
        assert_eq!(local_level(Some("debug")), LevelFilter::Debug);
        assert_eq!(local_level(Some("WARN")), LevelFilter::Warn);
        assert_eq!(local_level(Some("loud")), LevelFilter::Info);
    }
}
