use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{RaceSpaceError, telemetry::DEFAULT_TRACK_POINTS};

const CONFIG_FILE_NAME: &str = "config.json";
const APP_DIR_NAME: &str = "racespace";

pub const API_KEY_ENV: &str = "RACESPACE_API_KEY";
/// Older deployments exported the key under this name
pub const LEGACY_API_KEY_ENV: &str = "DEEPSEEKAPI";
pub const API_URL_ENV: &str = "RACESPACE_API_URL";
pub const MODEL_ENV: &str = "RACESPACE_MODEL";

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a professional motorsport analyst specializing in telemetry analysis.";

/// Settings for the text generation service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SummaryConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Upper bound on the wait for one completion request
    pub timeout_s: u64,
    pub system_prompt: String,
    /// Number of leading samples included in the prompt
    pub excerpt_len: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.deepseek.com/v1".to_string(),
            model: "deepseek-chat".to_string(),
            temperature: 0.6,
            timeout_s: 60,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            excerpt_len: 30,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub summary: SummaryConfig,
    /// Maximum number of points in the track polyline
    pub track_points: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            summary: SummaryConfig::default(),
            track_points: DEFAULT_TRACK_POINTS,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Result<PathBuf, RaceSpaceError> {
        Ok(dirs::config_dir()
            .ok_or(RaceSpaceError::NoConfigDir)?
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    pub fn from_file(path: &Path) -> Result<Self, RaceSpaceError> {
        let file =
            std::fs::File::open(path).map_err(|e| RaceSpaceError::ConfigIOError { source: e })?;
        serde_json::from_reader(file).map_err(|e| RaceSpaceError::ConfigSerializeError { source: e })
    }

    /// Loads the config at `path`, or the default location when no path is
    /// given. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, RaceSpaceError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        if config_path.exists() {
            info!("Loading config from {:?}", config_path);
            Self::from_file(&config_path)
        } else {
            debug!("No config file at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), RaceSpaceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RaceSpaceError::ConfigIOError { source: e })?;
        }
        let file =
            std::fs::File::create(path).map_err(|e| RaceSpaceError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| RaceSpaceError::ConfigSerializeError { source: e })
    }

    /// Applies environment overrides. `lookup` is `std::env::var` in the binary.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(API_KEY_ENV).or_else(|| lookup(LEGACY_API_KEY_ENV)) {
            self.summary.api_key = Some(key);
        }
        if let Some(url) = lookup(API_URL_ENV) {
            self.summary.base_url = url;
        }
        if let Some(model) = lookup(MODEL_ENV) {
            self.summary.model = model;
        }
        self
    }
}
