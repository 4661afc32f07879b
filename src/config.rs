//! The `sloth.toml` configuration file.
//!
//! ```toml
//! nice = true
//! say-yes = false
//! refresh-interval = 86400   # seconds
//! timeout = 3600             # seconds, 0 disables
//! ```

use anyhow::{Context, Result};
use chrono::TimeDelta;
use pkgkit::Settings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::paths;

/// One day
pub const DEFAULT_REFRESH_INTERVAL: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Run package manager commands under `nice`
    pub nice: bool,
    /// Answer yes to package manager prompts
    pub say_yes: bool,
    /// Seconds after which the package index counts as stale
    pub refresh_interval: u64,
    /// Seconds a command may run before it is killed, 0 for no limit
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nice: false,
            say_yes: false,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            timeout: 0,
        }
    }
}

impl Config {
    /// Load the configuration from the base directory
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    /// Load the configuration from `path`, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Backend settings, with `--yes` forcing `say-yes` on
    pub fn settings(&self, yes: bool) -> Settings {
        Settings {
            nice: self.nice,
            assume_yes: self.say_yes || yes,
            timeout: (self.timeout > 0).then(|| Duration::from_secs(self.timeout)),
        }
    }

    pub fn refresh_interval(&self) -> TimeDelta {
        let secs = i64::try_from(self.refresh_interval).unwrap_or(i64::MAX);
        TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("sloth.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.refresh_interval, DEFAULT_REFRESH_INTERVAL);
    }

    #[test]
    fn test_load_kebab_case_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sloth.toml");
        fs::write(&path, "nice = true\nsay-yes = true\nrefresh-interval = 3600\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.nice);
        assert!(config.say_yes);
        assert_eq!(config.refresh_interval, 3600);
        assert_eq!(config.timeout, 0);
        assert_eq!(config.refresh_interval(), TimeDelta::hours(1));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sloth.toml");
        fs::write(&path, "nice = \"very\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_settings() {
        let config = Config {
            nice: true,
            timeout: 30,
            ..Config::default()
        };

        let settings = config.settings(false);
        assert!(settings.nice);
        assert!(!settings.assume_yes);
        assert_eq!(settings.timeout, Some(Duration::from_secs(30)));

        assert!(config.settings(true).assume_yes);
        assert_eq!(Config::default().settings(false).timeout, None);
    }

    #[test]
    fn test_huge_interval_does_not_overflow() {
        let config = Config {
            refresh_interval: u64::MAX,
            ..Config::default()
        };
        assert_eq!(config.refresh_interval(), TimeDelta::MAX);
    }
}
