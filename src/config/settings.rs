use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, ensure};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::biometric::models::{
    DeviceConfig, RetryPolicy, DEFAULT_BASE_URL, DEFAULT_CAPTURE_TIMEOUT_MS, DEFAULT_DEVICE_NAME,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_SERIAL_NUMBER, DEFAULT_TEST_TIMEOUT_MS,
};

pub const APP_NAME: &str = "ETD Desktop Application";

/// Environment variable selecting the profile
pub const ENV_PROFILE: &str = "ETD_ENV";
/// Environment variable pointing at a JSON config file
pub const ENV_CONFIG_PATH: &str = "ETD_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value:?}")]
    Override { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] anyhow::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Anything other than "production" is development
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn from_env() -> Self {
        std::env::var(ENV_PROFILE)
            .map(|name| Self::from_name(&name))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BiometricSettings {
    pub base_url: String,
    pub device_name: String,
    pub serial_number: String,
    pub timeout_ms: u64,
    pub test_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    /// Backoff unit; attempt `n` waits `n * delay_ms`
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SslSettings {
    pub verify: bool,
    /// Log a warning whenever verification is off
    pub warnings: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    pub file_name: Option<String>,
}

impl LoggingSettings {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub environment: Environment,
    pub biometric: BiometricSettings,
    pub retry: RetrySettings,
    pub ssl: SslSettings,
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Built-in defaults for a profile
    pub fn for_environment(environment: Environment) -> Self {
        let production = environment == Environment::Production;
        Self {
            environment,
            biometric: BiometricSettings {
                base_url: DEFAULT_BASE_URL.to_string(),
                device_name: DEFAULT_DEVICE_NAME.to_string(),
                serial_number: DEFAULT_SERIAL_NUMBER.to_string(),
                timeout_ms: DEFAULT_CAPTURE_TIMEOUT_MS,
                test_timeout_ms: DEFAULT_TEST_TIMEOUT_MS,
            },
            retry: RetrySettings {
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                delay_ms: 2_000,
            },
            ssl: SslSettings {
                verify: production,
                warnings: !production,
            },
            logging: LoggingSettings {
                level: if production { "warn" } else { "debug" }.to_string(),
                file_name: Some("etd_app".to_string()),
            },
        }
    }

    /// Load using `ETD_ENV`, `ETD_CONFIG` and the `ETD_*` overrides from the process environment
    pub fn load() -> ConfigResult<Self> {
        let path = std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
        Self::load_from(Environment::from_env(), path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Like [`AppConfig::load`], but a failed load yields the `ETD_ENV` profile defaults
    /// together with the error.
    pub fn load_or_profile_defaults() -> (Self, Option<ConfigError>) {
        let path = std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
        Self::load_or_defaults_from(Environment::from_env(), path.as_deref(), |key| {
            std::env::var(key).ok()
        })
    }

    pub fn load_or_defaults_from<F>(
        environment: Environment,
        path: Option<&Path>,
        lookup: F,
    ) -> (Self, Option<ConfigError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        match Self::load_from(environment, path, lookup) {
            Ok(config) => (config, None),
            Err(e) => (Self::for_environment(environment), Some(e)),
        }
    }

    /// Profile defaults, then the JSON file (partial files keep the remaining defaults),
    /// then overrides from `lookup`, then validation.
    pub fn load_from<F>(environment: Environment, path: Option<&Path>, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::for_environment(environment);

        if let Some(path) = path {
            log::info!("Loading configuration from {}", path.display());
            let contents = std::fs::read_to_string(path)?;
            config = config.merged_with(serde_json::from_str(&contents)?)?;
        }

        config.apply_overrides(lookup)?;
        config.validate()?;

        log::debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    fn merged_with(self, overlay: Value) -> ConfigResult<Self> {
        let mut base = serde_json::to_value(&self)?;
        merge_json(&mut base, overlay);
        Ok(serde_json::from_value(base)?)
    }

    /// Apply `ETD_*` overrides
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn number<T: std::str::FromStr>(key: &str, value: String) -> ConfigResult<T> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Override { key: key.to_string(), value })
        }

        if let Some(v) = lookup("ETD_BIOMETRIC_BASE_URL") {
            self.biometric.base_url = v;
        }
        if let Some(v) = lookup("ETD_BIOMETRIC_DEVICE_NAME") {
            self.biometric.device_name = v;
        }
        if let Some(v) = lookup("ETD_BIOMETRIC_SERIAL_NUMBER") {
            self.biometric.serial_number = v;
        }
        if let Some(v) = lookup("ETD_BIOMETRIC_TIMEOUT_MS") {
            self.biometric.timeout_ms = number("ETD_BIOMETRIC_TIMEOUT_MS", v)?;
        }
        if let Some(v) = lookup("ETD_BIOMETRIC_TEST_TIMEOUT_MS") {
            self.biometric.test_timeout_ms = number("ETD_BIOMETRIC_TEST_TIMEOUT_MS", v)?;
        }
        if let Some(v) = lookup("ETD_RETRY_COUNT") {
            self.retry.max_attempts = number("ETD_RETRY_COUNT", v)?;
        }
        if let Some(v) = lookup("ETD_RETRY_DELAY_MS") {
            self.retry.delay_ms = number("ETD_RETRY_DELAY_MS", v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.check().map_err(ConfigError::Invalid)
    }

    fn check(&self) -> anyhow::Result<()> {
        let url = reqwest::Url::parse(&self.biometric.base_url)
            .map_err(|e| anyhow!("base_url {:?}: {}", self.biometric.base_url, e))?;
        ensure!(
            matches!(url.scheme(), "http" | "https"),
            "base_url must be http or https, got {}",
            url.scheme()
        );
        ensure!(!self.biometric.device_name.trim().is_empty(), "device_name is empty");
        ensure!(self.biometric.timeout_ms > 0, "timeout_ms must be positive");
        ensure!(self.biometric.test_timeout_ms > 0, "test_timeout_ms must be positive");
        ensure!(self.retry.max_attempts >= 1, "retry.max_attempts must be at least 1");
        ensure!(
            self.logging.level.parse::<log::LevelFilter>().is_ok(),
            "logging.level {:?} is not a log level",
            self.logging.level
        );
        Ok(())
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    pub fn device_config(&self) -> DeviceConfig {
        if !self.ssl.verify && self.ssl.warnings {
            log::warn!(
                "TLS certificate verification disabled for {}",
                self.biometric.base_url
            );
        }
        DeviceConfig {
            base_url: self.biometric.base_url.clone(),
            device_name: self.biometric.device_name.clone(),
            serial_number: self.biometric.serial_number.clone(),
            capture_timeout_ms: self.biometric.timeout_ms,
            test_timeout_ms: self.biometric.test_timeout_ms,
            accept_invalid_certs: !self.ssl.verify,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.max_attempts, Duration::from_millis(self.retry.delay_ms))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Development)
    }
}

/// Recursively overlay `overlay` onto `base`; objects merge, everything else replaces.
fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
