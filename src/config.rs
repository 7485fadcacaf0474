use std::path::PathBuf;

use tracing::Level;

use crate::logging::parse_level_str;

/// Runtime settings of the `userstate` binary, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Request file. `None` reads stdin.
    pub input: Option<PathBuf>,
    pub pretty: bool,
    pub log_level: Level,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let input = lookup("USERSTATE_INPUT")
            .filter(|s| !s.is_empty() && s != "-")
            .map(PathBuf::from);
        let pretty = lookup("USERSTATE_PRETTY")
            .is_some_and(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes"));
        let log_level = lookup("USERSTATE_LOG")
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(Level::INFO);
        Self {
            input,
            pretty,
            log_level,
        }
    }
}
