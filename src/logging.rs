//! Logging initialization built on `tracing-subscriber`.
//!
//! Records emitted through the `log` facade (used across the sqlgate crates)
//! are bridged into `tracing` via `tracing-log`, so a single subscriber
//! handles everything.

use std::fs::OpenOptions;
use std::str::FromStr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unknown log format: {}", other)),
        }
    }
}

/// Build an `EnvFilter` from a base level plus per-target overrides.
fn build_env_filter(level: &str, target_levels: &[(String, String)]) -> EnvFilter {
    let mut directives = vec![level.to_string()];
    for (target, target_level) in target_levels {
        directives.push(format!("{}={}", target, target_level));
    }
    EnvFilter::new(directives.join(","))
}

/// Initialize global logging from configuration.
///
/// Fails if called twice, or if the log file cannot be opened.
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let format: LogFormat = settings.format.parse()?;

    let mut target_levels: Vec<(String, String)> = settings
        .target_levels
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    target_levels.sort();

    // Route `log` records into the tracing pipeline. Ignore the error when a
    // logger is already set, so tests can call this repeatedly.
    tracing_log::LogTracer::init().ok();

    let console_layer = if settings.log_to_console {
        Some(fmt::layer().with_target(true))
    } else {
        None
    };

    let file_layer = match &settings.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = match format {
                LogFormat::Json => fmt::layer().json().with_writer(file).boxed(),
                LogFormat::Compact => {
                    fmt::layer().compact().with_ansi(false).with_writer(file).boxed()
                }
            };
            Some(layer)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(build_env_filter(&settings.level, &target_levels))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Console-only logging at the given level; handy for tests and examples.
pub fn init_simple_logging(level: &str) -> anyhow::Result<()> {
    let settings = LoggingSettings {
        level: level.to_string(),
        ..LoggingSettings::default()
    };
    init_logging(&settings)
}
