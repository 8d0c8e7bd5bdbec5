//! Wraith client configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, WraithError};

/// Root client configuration, loaded from `~/.wraith/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WraithConfig {
    /// Path to the timeline file the agent replays.
    #[serde(default = "default_timeline_path")]
    pub timeline_path: String,
    /// Append-only log that collects one line per executed command.
    #[serde(default = "default_report_log")]
    pub report_log: String,
    /// How often (seconds) the agent checks the timeline file for edits.
    #[serde(default = "default_reload_check_secs")]
    pub reload_check_secs: u64,
}

fn default_timeline_path() -> String {
    WraithConfig::home_dir()
        .join("timeline.json")
        .display()
        .to_string()
}

fn default_report_log() -> String {
    WraithConfig::home_dir()
        .join("logs")
        .join("timeline.log")
        .display()
        .to_string()
}

fn default_reload_check_secs() -> u64 {
    5
}

impl Default for WraithConfig {
    fn default() -> Self {
        Self {
            timeline_path: default_timeline_path(),
            report_log: default_report_log(),
            reload_check_secs: default_reload_check_secs(),
        }
    }
}

impl WraithConfig {
    /// Load config from the default path, falling back to defaults if absent.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WraithError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| WraithError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| WraithError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Wraith home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".wraith")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_usable() {
        let config = WraithConfig::default();
        assert!(config.timeline_path.ends_with("timeline.json"));
        assert!(config.report_log.ends_with("timeline.log"));
        assert_eq!(config.reload_check_secs, 5);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeline_path = \"/tmp/custom.json\"").unwrap();
        let config = WraithConfig::load_from(file.path()).unwrap();
        assert_eq!(config.timeline_path, "/tmp/custom.json");
        assert_eq!(config.reload_check_secs, 5);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeline_path = [not toml").unwrap();
        let err = WraithConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, WraithError::Config(_)));
    }
}
