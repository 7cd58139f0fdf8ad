use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ConfigError;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:3400";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DISPLAY_SECONDS: u32 = 10;
pub const DEFAULT_WORD_COUNT: usize = 10;

pub const DEFAULT_WORD_BANK: [&str; 10] = [
    "River", "Mountain", "Forest", "Ocean", "Valley", "Sun", "Moon", "Star", "Cloud", "Rain",
];

/// Stand-in for a real behavioral-telemetry feed.
pub const DEFAULT_BEHAVIORAL_DATA: &str = "User interacts with the app twice a week. Task completion times have increased by 15% over the last month.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    pub service: ServiceConfig,
    pub recall: RecallConfig,
    pub behavioral_data: String,
    pub report_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    pub word_bank: Vec<String>,
    pub word_count: usize,
    pub display_seconds: u32,
    /// Fixes the word selection and shuffle for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            recall: RecallConfig::default(),
            behavioral_data: DEFAULT_BEHAVIORAL_DATA.to_string(),
            report_dir: PathBuf::from("reports"),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            word_bank: DEFAULT_WORD_BANK.iter().map(|w| w.to_string()).collect(),
            word_count: DEFAULT_WORD_COUNT,
            display_seconds: DEFAULT_DISPLAY_SECONDS,
            seed: None,
        }
    }
}

impl RecallConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.word_count == 0 {
            return Err(ConfigError::Invalid("recall.word_count must be at least 1".into()));
        }
        if self.word_count > self.word_bank.len() {
            return Err(ConfigError::Invalid(format!(
                "recall.word_count {} exceeds word bank size {}",
                self.word_count,
                self.word_bank.len()
            )));
        }
        if self.word_bank.iter().any(|w| w.trim().is_empty()) {
            return Err(ConfigError::Invalid("recall.word_bank contains a blank word".into()));
        }
        if self.display_seconds == 0 {
            return Err(ConfigError::Invalid("recall.display_seconds must be at least 1".into()));
        }
        Ok(())
    }
}

impl ScreeningConfig {
    /// File (if any), then environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        info!(
            service = %config.service.base_url,
            words = config.recall.word_count,
            display_seconds = config.recall.display_seconds,
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// `lookup` resolves an environment variable name to its value.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("COGSCREEN_SERVICE_URL") {
            self.service.base_url = url;
        }
        if let Some(raw) = lookup("COGSCREEN_TIMEOUT_SECS") {
            self.service.timeout_secs = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("COGSCREEN_TIMEOUT_SECS is not a number: {raw}"))
            })?;
        }
        if let Some(dir) = lookup("COGSCREEN_REPORT_DIR") {
            self.report_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("COGSCREEN_SEED") {
            let seed = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("COGSCREEN_SEED is not a number: {raw}"))
            })?;
            self.recall.seed = Some(seed);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.timeout_secs == 0 {
            return Err(ConfigError::Invalid("service.timeout_secs must be at least 1".into()));
        }
        if self.service.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("service.base_url is empty".into()));
        }
        self.recall.validate()
    }
}
