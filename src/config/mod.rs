pub mod settings;

pub use settings::{
    AppConfig, BiometricSettings, ConfigError, ConfigResult, Environment, LoggingSettings,
    RetrySettings, SslSettings, APP_NAME,
};
