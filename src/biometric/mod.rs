pub mod client;
pub mod codes;
pub mod logging;
pub mod models;
pub mod retry;
pub mod service;

pub use client::DeviceClient;
pub use codes::error_message;
pub use logging::{DeviceLog, LogFacade, NullLog};
pub use models::*;
pub use retry::RetryExecutor;
pub use service::BiometricService;

/// A fingerprint scanner reachable through single-attempt calls
#[async_trait::async_trait]
pub trait FingerprintScanner: Send + Sync {
    /// Probe the scanner without capturing
    async fn test_connection(&self) -> CaptureResult;

    /// Capture one fingerprint; `None` uses the configured capture timeout
    async fn capture(&self, timeout_ms: Option<u64>) -> CaptureResult;
}

#[derive(Debug, thiserror::Error)]
pub enum BiometricError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("Invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Request(reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

impl From<reqwest::Error> for BiometricError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BiometricError::Timeout
        } else if e.is_connect() {
            BiometricError::Connection(e.to_string())
        } else if let Some(status) = e.status() {
            BiometricError::Status(status)
        } else {
            BiometricError::Request(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, BiometricError>;
