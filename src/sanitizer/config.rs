//! Engine configuration file
//!
//! ```json
//! {
//!   "default_error": { "msg": "Invalid param", "code": -1, "status": 400 },
//!   "date_format": "YYYY-MM-DD HH:mm:ss"
//! }
//! ```
//!
//! `default_error` may also be a plain string. Every field is optional.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::datetime::DEFAULT_FORMAT;
use super::engine::{Engine, EngineOptions, DEFAULT_ERROR_MESSAGE};
use super::errors::{ConfigError, ConfigResult, ErrorSpec};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "./od-sanitize.json";

/// Configured default error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorConfig {
    Message(String),
    Record {
        msg: String,
        #[serde(default)]
        code: Option<i64>,
        #[serde(default)]
        status: Option<u16>,
    },
}

impl Default for ErrorConfig {
    fn default() -> Self {
        ErrorConfig::Message(DEFAULT_ERROR_MESSAGE.to_string())
    }
}

impl From<ErrorConfig> for ErrorSpec {
    fn from(config: ErrorConfig) -> Self {
        match config {
            ErrorConfig::Message(msg) => ErrorSpec::Message(msg),
            ErrorConfig::Record { msg, code, status } => ErrorSpec::Record {
                msg: Some(msg),
                code,
                status,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Error raised by factories configured without one
    #[serde(default)]
    pub default_error: ErrorConfig,

    /// Default `date_time` format (moment-style tokens)
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_date_format() -> String {
    DEFAULT_FORMAT.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_error: ErrorConfig::default(),
            date_format: default_date_format(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(content)
            .map_err(|e| ConfigError::InvalidConfig(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if let ErrorConfig::Record {
            status: Some(status), ..
        } = &self.default_error
        {
            if !(400..600).contains(status) {
                return Err(ConfigError::InvalidConfig(format!(
                    "default_error.status must be a 4xx or 5xx code, got {}",
                    status
                )));
            }
        }

        if self.date_format.trim().is_empty() {
            return Err(ConfigError::InvalidConfig("date_format must not be empty".into()));
        }

        Ok(())
    }

    pub fn into_options(self) -> EngineOptions {
        EngineOptions {
            default_error: self.default_error.into(),
            date_format: self.date_format,
        }
    }

    pub fn into_engine(self) -> Engine {
        Engine::new(self.into_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.date_format, "YYYY-MM-DD HH:mm:ss");
    }

    #[test]
    fn test_plain_message_error() {
        let config = EngineConfig::from_json_str(r#"{"default_error": "Bad input"}"#).unwrap();
        let engine = config.into_engine();
        let err = engine.positive_int(None).run(&json!(-1)).unwrap_err();
        assert_eq!((err.message.as_str(), err.status), ("Bad input", 400));
    }

    #[test]
    fn test_record_error() {
        let config = EngineConfig::from_json_str(
            r#"{"default_error": {"msg": "Unprocessable", "code": 1042, "status": 422}}"#,
        )
        .unwrap();
        let err = config
            .into_engine()
            .non_empty_string(None)
            .run(&json!(""))
            .unwrap_err();
        assert_eq!(err.message, "Unprocessable");
        assert_eq!((err.code, err.status), (1042, 422));
    }

    #[test]
    fn test_config_rejects_bad_status() {
        let result = EngineConfig::from_json_str(r#"{"default_error": {"msg": "x", "status": 200}}"#);
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_rejects_empty_format() {
        assert!(EngineConfig::from_json_str(r#"{"date_format": "  "}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("od-sanitize.json");
        fs::write(&config_path, json!({"date_format": "YYYY/MM/DD"}).to_string()).unwrap();

        let config = EngineConfig::load(&config_path).unwrap();
        assert_eq!(config.date_format, "YYYY/MM/DD");

        let missing = EngineConfig::load(&temp_dir.path().join("nope.json"));
        assert!(missing.is_err());
    }
}
