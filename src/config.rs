//! Assistant configuration.
//!
//! Settings come from a TOML file (all keys optional) with environment
//! variables layered on top:
//!
//! ```toml
//! [model]
//! api_key = "..."
//! text_model = "gemini-2.5-flash"
//! vision_model = "gemini-2.5-flash"
//! timeout_secs = 120
//!
//! [render]
//! command = "soffice"
//! visual_dir = "temp_visuals"
//!
//! [logging]
//! level = "info"
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DECKPILOT_CONFIG";
/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "deckpilot.toml";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "ModelConfig::default_model")]
    pub text_model: String,
    #[serde(default = "ModelConfig::default_model")]
    pub vision_model: String,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default = "ModelConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ModelConfig {
    fn default_model() -> String {
        DEFAULT_MODEL.to_string()
    }

    fn default_timeout() -> u64 {
        120
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            text_model: Self::default_model(),
            vision_model: Self::default_model(),
            api_base: None,
            timeout_secs: Self::default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Conversion command; probed from the usual install locations when unset
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default = "RenderConfig::default_visual_dir")]
    pub visual_dir: PathBuf,
    /// Set to false to never render
    #[serde(default = "RenderConfig::default_enabled")]
    pub enabled: bool,
}

impl RenderConfig {
    fn default_visual_dir() -> PathBuf {
        PathBuf::from("temp_visuals")
    }

    fn default_enabled() -> bool {
        true
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            command: None,
            visual_dir: Self::default_visual_dir(),
            enabled: Self::default_enabled(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "warn".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

impl AssistantConfig {
    /// Load from an explicit path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content, path)
    }

    fn from_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Resolve the config file and apply environment overrides.
    ///
    /// Order: `explicit`, then `$DECKPILOT_CONFIG`, then `./deckpilot.toml`.
    /// Built-in defaults are used when none of them exists.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit {
            Self::from_file(path)?
        } else if let Some(path) = env::var_os(CONFIG_ENV) {
            Self::from_file(PathBuf::from(path))?
        } else {
            let local = Path::new(DEFAULT_CONFIG_FILE);
            if local.exists() {
                Self::from_file(local)?
            } else {
                Self::default()
            }
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty("GOOGLE_API_KEY") {
            self.model.api_key = Some(key);
        }
        if let Some(model) = non_empty("GEMINI_TEXT_MODEL") {
            self.model.text_model = model;
        }
        if let Some(model) = non_empty("GEMINI_VISION_MODEL") {
            self.model.vision_model = model;
        }
        if let Some(base) = non_empty("GEMINI_API_BASE") {
            self.model.api_base = Some(base);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AssistantConfig::default();
        assert_eq!(config.model.text_model, "gemini-2.5-flash");
        assert_eq!(config.model.vision_model, "gemini-2.5-flash");
        assert_eq!(config.model.timeout(), Duration::from_secs(120));
        assert_eq!(config.render.visual_dir, PathBuf::from("temp_visuals"));
        assert!(config.render.enabled);
        assert!(config.model.api_key.is_none());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deckpilot.toml");
        fs::write(
            &path,
            "[model]\nvision_model = \"gemini-2.5-pro\"\n\n[render]\nenabled = false\n",
        )
        .unwrap();

        let config = AssistantConfig::from_file(&path).unwrap();
        assert_eq!(config.model.text_model, DEFAULT_MODEL);
        assert_eq!(config.model.vision_model, "gemini-2.5-pro");
        assert!(!config.render.enabled);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[model\ntext_model = 3").unwrap();
        let err = AssistantConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_explicit_missing_file() {
        let err = AssistantConfig::discover(Some(Path::new("/nonexistent/deckpilot.toml")))
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GOOGLE_API_KEY", "secret"),
            ("GEMINI_TEXT_MODEL", "gemini-2.0-flash"),
            ("GEMINI_VISION_MODEL", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = AssistantConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.model.api_key.as_deref(), Some("secret"));
        assert_eq!(config.model.text_model, "gemini-2.0-flash");
        assert_eq!(config.model.vision_model, DEFAULT_MODEL);
        assert!(config.model.api_base.is_none());
    }
}
