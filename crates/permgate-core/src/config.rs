//! Configuration resolution for permgate.
//!
//! Implements layered config resolution:
//! 1. Built-in defaults
//! 2. Optional JSON config file
//! 3. Environment variables (highest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// First platform level at which capabilities are gated at run time.
pub const DEFAULT_GATING_THRESHOLD: u32 = 23;

/// Complete permgate configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Platform version gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Level of the platform the host runs on.
    pub api_level: u32,
    /// Below this level every capability counts as granted.
    pub gating_threshold: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_level: DEFAULT_GATING_THRESHOLD,
            gating_threshold: DEFAULT_GATING_THRESHOLD,
        }
    }
}

impl PlatformConfig {
    /// Whether capabilities need a run-time grant on this platform.
    pub const fn is_gated(&self) -> bool {
        self.api_level >= self.gating_threshold
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Load configuration: defaults, then `path` if given, then environment.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(path) = path {
        config = load_config_file(path)?;
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;

    Ok(config)
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Reject settings that would only fail later, when tracing is initialised.
fn validate(config: &Config) -> Result<()> {
    let directive = format!("permgate={}", config.logging.level);
    tracing_subscriber::EnvFilter::try_new(&directive).map_err(|e| {
        Error::Config(format!("Invalid log level {:?}: {}", config.logging.level, e))
    })?;
    Ok(())
}

fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(n) = lookup("PERMGATE_API_LEVEL").and_then(|v| v.parse().ok()) {
        config.platform.api_level = n;
    }
    if let Some(n) = lookup("PERMGATE_GATING_THRESHOLD").and_then(|v| v.parse().ok()) {
        config.platform.gating_threshold = n;
    }
    if let Some(level) = lookup("PERMGATE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("PERMGATE_LOG_JSON").and_then(|v| v.parse().ok()) {
        config.logging.json = json;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_gated() {
        let config = Config::default();
        assert!(config.platform.is_gated());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn below_threshold_is_not_gated() {
        let platform = PlatformConfig {
            api_level: 22,
            gating_threshold: DEFAULT_GATING_THRESHOLD,
        };
        assert!(!platform.is_gated());
    }

    #[test]
    fn loads_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permgate.json");
        std::fs::write(&path, r#"{"platform": {"api_level": 21, "gating_threshold": 23}}"#)
            .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.platform.api_level, 21);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("absent.json")));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn malformed_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permgate.json");
        std::fs::write(&path, r#"{"platform": {"api_level": "high"}}"#).unwrap();

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn invalid_log_level_is_config_error() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(validate(&config), Err(Error::Config(_))));

        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("PERMGATE_API_LEVEL", "30"),
            ("PERMGATE_LOG_LEVEL", "debug"),
            ("PERMGATE_LOG_JSON", "true"),
            ("PERMGATE_GATING_THRESHOLD", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(ToString::to_string));

        assert_eq!(config.platform.api_level, 30);
        assert_eq!(config.platform.gating_threshold, DEFAULT_GATING_THRESHOLD);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }
}
