//! log4rs setup for the runner
//!
//! Library crates only use the `log` facade; this is the single place a logger is
//! installed.

use anyhow::{Context, Result};
use log4rs::{
    append::{console::ConsoleAppender, console::Target, file::FileAppender},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Handle,
};

use crate::config::LogConfig;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:<5} {t} {m}{n}";

/// Build the log4rs configuration without installing it
pub fn build_config(log: &LogConfig) -> Result<Config> {
    let encoder = Box::new(PatternEncoder::new(PATTERN));
    let appender = match &log.path {
        Some(path) => {
            let file = FileAppender::builder()
                .encoder(encoder)
                .build(path)
                .with_context(|| format!("failed to open log file {}", path))?;
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(log.level)))
                .build("main", Box::new(file))
        }
        None => {
            // stdout stays free for anything piped out of the runner
            let console = ConsoleAppender::builder()
                .encoder(encoder)
                .target(Target::Stderr)
                .build();
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(log.level)))
                .build("main", Box::new(console))
        }
    };

    Config::builder()
        .appender(appender)
        .build(Root::builder().appender("main").build(log.level))
        .context("invalid logging configuration")
}

/// Install the global logger
pub fn init(log: &LogConfig) -> Result<Handle> {
    let config = build_config(log)?;
    log4rs::init_config(config).context("a global logger is already installed")
}
