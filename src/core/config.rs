//! Engine configuration
//!
//! Loaded from RON or JSON. Every field has a default, so a config file only
//! needs the values it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Application title, used in logs
    pub title: String,
    /// Fixed update rate driven by [`Engine::tick`](super::Engine::tick)
    pub target_ups: u32,
    /// Upper bound on frames run by one `tick`, so a long stall cannot spiral
    pub max_frames_per_tick: u32,
    /// Default `env_logger` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: String::from("Scene Engine"),
            target_ups: 60,
            max_frames_per_tick: 5,
            log_filter: String::from("info"),
        }
    }
}

impl EngineConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_target_ups(mut self, ups: u32) -> Self {
        self.target_ups = ups;
        self
    }

    pub fn with_max_frames_per_tick(mut self, frames: u32) -> Self {
        self.max_frames_per_tick = frames;
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Parse a config from a RON string
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse a config from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a config file, choosing the format by extension (`.json`, else RON)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_ron_str(&content)
        }
    }

    /// Save the config as pretty RON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, text).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

/// Errors that can occur while loading a config
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// IO error
    Io(String),
    /// Malformed config
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Parse(e) => write!(f, "Config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = EngineConfig::from_ron_str("(title: \"Orbit\", target_ups: 30)").unwrap();
        assert_eq!(config.title, "Orbit");
        assert_eq!(config.target_ups, 30);
        assert_eq!(config.max_frames_per_tick, 5);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_json_config() {
        let config =
            EngineConfig::from_json_str(r#"{"log_filter": "scene_engine=trace"}"#).unwrap();
        assert_eq!(config.log_filter, "scene_engine=trace");
        assert_eq!(config.target_ups, 60);
    }

    #[test]
    fn test_malformed_config_is_parse_error() {
        assert!(matches!(
            EngineConfig::from_ron_str("(target_ups: \"fast\")"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::load("/nonexistent/engine.ron"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_save_and_load_ron_file() {
        let path = std::env::temp_dir().join(format!("scene-engine-{}.ron", std::process::id()));
        let config = EngineConfig::default()
            .with_title("Saved")
            .with_max_frames_per_tick(2);

        config.save_ron(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
