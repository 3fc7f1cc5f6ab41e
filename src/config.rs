use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants::{
    BASE_URL_ENV, DEFAULT_BASE_DELAY_MS, DEFAULT_BASE_URL, DEFAULT_CONFIG_PATH,
    DEFAULT_INACTIVITY_THRESHOLD_DAYS, DEFAULT_LOG_DIRECTORY, DEFAULT_LOG_FILE_PREFIX,
    DEFAULT_LOG_FILTER, DEFAULT_MAX_ATTEMPTS, DEFAULT_REFERENCE_DATE, DEFAULT_SERVER_PORT,
    MAX_INACTIVITY_THRESHOLD_DAYS,
};
use crate::domain::Timestamp;
use crate::error::{CleanupError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub retry: RetryConfig,
    pub classification: ClassificationConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub base_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub inactivity_threshold_days: i64,
    /// Fixed "today" for reports, as `YYYY-MM-DD`
    pub reference_date: String,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            inactivity_threshold_days: DEFAULT_INACTIVITY_THRESHOLD_DAYS,
            reference_date: DEFAULT_REFERENCE_DATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_prefix: String,
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: DEFAULT_LOG_DIRECTORY.to_string(),
            file_prefix: DEFAULT_LOG_FILE_PREFIX.to_string(),
            default_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration. An explicit path must exist; the default
    /// `config.toml` is optional and falls back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.sources.base_url = base_url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CleanupError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(CleanupError::Config("retry.max_attempts must be at least 1".into()));
        }
        let threshold = self.classification.inactivity_threshold_days;
        if !(0..=MAX_INACTIVITY_THRESHOLD_DAYS).contains(&threshold) {
            return Err(CleanupError::Config(format!(
                "classification.inactivity_threshold_days must be between 0 and {}, got {}",
                MAX_INACTIVITY_THRESHOLD_DAYS, threshold
            )));
        }
        if self.sources.base_url.trim().is_empty() {
            return Err(CleanupError::Config("sources.base_url must not be empty".into()));
        }
        self.reference_time()?;
        Ok(())
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.retry.base_delay_ms)
    }

    /// The configured reference instant, UTC midnight of `reference_date`.
    pub fn reference_time(&self) -> Result<Timestamp> {
        parse_reference_date(&self.classification.reference_date)
    }
}

/// Parse a `YYYY-MM-DD` reference date into UTC midnight.
pub fn parse_reference_date(raw: &str) -> Result<Timestamp> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CleanupError::Config(format!("Invalid reference date '{}', expected YYYY-MM-DD", raw)))
}
