//! Runner configuration from environment variables
//!
//! | Variable | Default |
//! |----------|---------|
//! | `MINTRIS_WIDTH` / `MINTRIS_HEIGHT` | 10 / 20 |
//! | `MINTRIS_LEVEL` | 1 |
//! | `MINTRIS_SPAWN_GRACE_MS` | 250 |
//! | `MINTRIS_SEED` | derived from the system clock |
//! | `MINTRIS_LOG_PATH` | unset (log to stderr) |
//! | `MINTRIS_LOG_LEVEL` | `info` |
//!
//! A variable that is set but does not parse is an error, never silently defaulted.

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use log::LevelFilter;

use crate::core::GameConfig;
use crate::types::{MAX_BOARD_DIM, MIN_BOARD_DIM};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Append to this file instead of writing to stderr
    pub path: Option<String>,
    pub level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: None,
            level: LevelFilter::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub game: GameConfig,
    pub log: LogConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; used by tests
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = GameConfig::default();

        let width = parse_var(&lookup, "MINTRIS_WIDTH")?.unwrap_or(defaults.width);
        let height = parse_var(&lookup, "MINTRIS_HEIGHT")?.unwrap_or(defaults.height);
        for (name, value) in [("MINTRIS_WIDTH", width), ("MINTRIS_HEIGHT", height)] {
            if !(MIN_BOARD_DIM..=MAX_BOARD_DIM).contains(&value) {
                bail!(
                    "{} must be between {} and {}, got {}",
                    name,
                    MIN_BOARD_DIM,
                    MAX_BOARD_DIM,
                    value
                );
            }
        }

        let level = parse_var(&lookup, "MINTRIS_LEVEL")?.unwrap_or(defaults.starting_level);
        let spawn_grace_ms =
            parse_var(&lookup, "MINTRIS_SPAWN_GRACE_MS")?.unwrap_or(defaults.spawn_grace_ms);
        let seed = match parse_var(&lookup, "MINTRIS_SEED")? {
            Some(seed) => seed,
            None => clock_seed(),
        };

        let path = lookup("MINTRIS_LOG_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let level_filter = match lookup("MINTRIS_LOG_LEVEL") {
            Some(s) => LevelFilter::from_str(s.trim())
                .with_context(|| format!("MINTRIS_LOG_LEVEL is not a log level: {:?}", s))?,
            None => LevelFilter::Info,
        };

        Ok(Self {
            game: GameConfig::default()
                .with_size(width, height)
                .with_starting_level(level)
                .with_spawn_grace_ms(spawn_grace_ms)
                .with_seed(seed),
            log: LogConfig {
                path,
                level: level_filter,
            },
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
    }
}

fn clock_seed() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(1)
}
