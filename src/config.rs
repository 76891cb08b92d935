//! JSON-based engine configuration.
//!
//! Every field has a default, so an empty object (or no file at all) gives
//! the built-in model with 24-hour display.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::encoder::{is_valid_time_format, ReportEncoder, DEFAULT_TIME_FORMAT};
use crate::error::ConfigError;
use crate::model::{BuiltinModel, JsonModelFile, ModelLoader};

/// Where the predictive model comes from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ModelSource {
    #[default]
    Builtin,
    File { path: PathBuf },
}

impl ModelSource {
    pub fn loader(&self) -> Box<dyn ModelLoader> {
        match self {
            ModelSource::Builtin => Box::new(BuiltinModel),
            ModelSource::File { path } => Box::new(JsonModelFile::new(path.clone())),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelSource,
    /// strftime pattern for the bedtime message
    #[serde(default = "default_time_format")]
    pub time_format: String,
    /// Echo normalized inputs in reports
    #[serde(default)]
    pub include_input: bool,
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelSource::default(),
            time_format: default_time_format(),
            include_input: false,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the encoder could not render
    pub fn validate(&self) -> Result<(), ConfigError> {
        if is_valid_time_format(&self.time_format) {
            Ok(())
        } else {
            Err(ConfigError::InvalidTimeFormat(self.time_format.clone()))
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Report encoder matching the display settings
    pub fn encoder(&self) -> ReportEncoder {
        ReportEncoder::new()
            .with_time_format(self.time_format.clone())
            .with_input(self.include_input)
    }
}
