// Configuration module
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Main sqlgate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Session protocol settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Author secret size in bytes; hex-encodes to twice this many chars
    #[serde(default = "default_secret_length_bytes")]
    pub secret_length_bytes: usize,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Optional log file path; console-only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default = "default_true")]
    pub log_to_console: bool,
    /// Per-target level overrides, e.g. `sqlgate_core = "debug"`
    #[serde(default)]
    pub target_levels: HashMap<String, String>,
}

fn default_secret_length_bytes() -> usize {
    32
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            secret_length_bytes: default_secret_length_bytes(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            log_to_console: default_true(),
            target_levels: HashMap::new(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            session: SessionSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl GateConfig {
    /// Load configuration from a TOML file, then apply environment variable
    /// overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(&path)?;
        let mut config: GateConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment variables take precedence over file values:
    /// `SQLGATE_LOG_LEVEL`, `SQLGATE_LOG_FORMAT`, `SQLGATE_SECRET_LENGTH`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("SQLGATE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("SQLGATE_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(len) = std::env::var("SQLGATE_SECRET_LENGTH") {
            if let Ok(len) = len.parse::<usize>() {
                self.session.secret_length_bytes = len;
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        // 16 bytes is the floor for a credible signing key
        if self.session.secret_length_bytes < 16 {
            anyhow::bail!(
                "session.secret_length_bytes must be at least 16, got {}",
                self.session.secret_length_bytes
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GateConfig::default();
        assert_eq!(config.session.secret_length_bytes, 32);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "compact");
        assert!(config.logging.log_to_console);
    }

    #[test]
    fn test_from_file_with_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[logging]\nlevel = \"debug\"\n\n[logging.target_levels]\nsqlgate_core = \"trace\""
        )
        .unwrap();

        let config = GateConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.logging.target_levels.get("sqlgate_core").map(String::as_str),
            Some("trace")
        );
        // Missing sections fall back to defaults
        assert_eq!(config.session.secret_length_bytes, 32);
    }

    #[test]
    fn test_short_secret_length_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nsecret_length_bytes = 8").unwrap();
        assert!(GateConfig::from_file(file.path()).is_err());
    }
}
