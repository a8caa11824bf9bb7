use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::codes;

pub const DEFAULT_BASE_URL: &str = "https://localhost:8443";
pub const DEFAULT_DEVICE_NAME: &str = "HU20";
pub const DEFAULT_SERIAL_NUMBER: &str = "H58220311290";
pub const DEFAULT_CAPTURE_TIMEOUT_MS: u64 = 25_000;
pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Connection parameters for one SecuGen WebAPI endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    pub base_url: String,
    pub device_name: String,
    pub serial_number: String,
    pub capture_timeout_ms: u64,
    pub test_timeout_ms: u64,
    /// Skip TLS certificate checks (the WebAPI ships a self-signed cert)
    pub accept_invalid_certs: bool,
}

impl DeviceConfig {
    /// Full URL of the capture endpoint
    pub fn capture_url(&self) -> String {
        format!("{}/SGIFPCapture", self.base_url.trim_end_matches('/'))
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            serial_number: DEFAULT_SERIAL_NUMBER.to_string(),
            capture_timeout_ms: DEFAULT_CAPTURE_TIMEOUT_MS,
            test_timeout_ms: DEFAULT_TEST_TIMEOUT_MS,
            accept_invalid_certs: true,
        }
    }
}

/// Attempt budget and linear backoff unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Wait before the zero-based `attempt`. The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

fn missing_error_code() -> i64 {
    codes::MISSING_ERROR_CODE
}

/// Decoded `SGIFPCapture` response body.
///
/// Fields the WebAPI adds beyond the known set are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceResponse {
    #[serde(default = "missing_error_code")]
    pub error_code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_quality: Option<i64>,
    #[serde(rename = "NFIQ", default, skip_serializing_if = "Option::is_none")]
    pub nfiq: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceResponse {
    pub fn is_ok(&self) -> bool {
        self.error_code == codes::SUCCESS
    }

    /// Template string, treating an empty string the same as a missing one
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref().filter(|t| !t.is_empty())
    }

    /// True when the response is a success from exactly the configured scanner
    pub fn matches_device(&self, config: &DeviceConfig) -> bool {
        self.is_ok()
            && self.model.as_deref() == Some(config.device_name.as_str())
            && self.serial_number.as_deref() == Some(config.serial_number.as_str())
    }
}

/// Outcome of one device call. Failures are data, never panics or `Err`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaptureResult {
    Success {
        data: DeviceResponse,
    },
    Failure {
        error: String,
        data: Option<DeviceResponse>,
    },
}

impl CaptureResult {
    pub fn success(data: DeviceResponse) -> Self {
        CaptureResult::Success { data }
    }

    pub fn failure(error: impl Into<String>, data: Option<DeviceResponse>) -> Self {
        CaptureResult::Failure {
            error: error.into(),
            data,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CaptureResult::Success { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CaptureResult::Success { .. } => None,
            CaptureResult::Failure { error, .. } => Some(error),
        }
    }

    pub fn data(&self) -> Option<&DeviceResponse> {
        match self {
            CaptureResult::Success { data } => Some(data),
            CaptureResult::Failure { data, .. } => data.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Scanner identity as shown on the device status panel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceInfo {
    pub model: String,
    pub serial_number: String,
    pub manufacturer: String,
    pub version: String,
    pub error_code: i64,
    pub connection_status: ConnectionStatus,
    pub error: Option<String>,
}

impl DeviceInfo {
    pub fn from_result(result: &CaptureResult) -> Self {
        const UNKNOWN: &str = "Unknown";
        match result {
            CaptureResult::Success { data } => {
                let field = |v: &Option<String>| v.clone().unwrap_or_else(|| UNKNOWN.to_string());
                Self {
                    model: field(&data.model),
                    serial_number: field(&data.serial_number),
                    manufacturer: field(&data.manufacturer),
                    version: field(&data.version),
                    error_code: data.error_code,
                    connection_status: ConnectionStatus::Connected,
                    error: None,
                }
            }
            CaptureResult::Failure { error, .. } => Self {
                model: UNKNOWN.to_string(),
                serial_number: UNKNOWN.to_string(),
                manufacturer: UNKNOWN.to_string(),
                version: UNKNOWN.to_string(),
                error_code: codes::MISSING_ERROR_CODE,
                connection_status: ConnectionStatus::Disconnected,
                error: Some(error.clone()),
            },
        }
    }
}

/// Quality metrics extracted from a capture response
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureQuality {
    pub image_quality: i64,
    pub nfiq: i64,
    pub template_length: usize,
    pub error_code: i64,
}

impl CaptureQuality {
    pub fn from_response(data: &DeviceResponse) -> Self {
        Self {
            image_quality: data.image_quality.unwrap_or(0),
            nfiq: data.nfiq.unwrap_or(0),
            template_length: data.template.as_deref().map(str::len).unwrap_or(0),
            error_code: data.error_code,
        }
    }
}

/// Fingerprint payload attached to a citizen application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintRecord {
    pub id: Uuid,
    pub fingerprint_template_base64: String,
    pub template_sha256: String,
    pub fingerprint_device_model: Option<String>,
    pub fingerprint_device_serial: Option<String>,
    pub image_quality: Option<i64>,
    pub nfiq: Option<i64>,
    pub captured_at: DateTime<Utc>,
}

impl FingerprintRecord {
    /// Build a record from a successful capture; `None` for failures or empty templates.
    pub fn from_capture(result: &CaptureResult) -> Option<Self> {
        let CaptureResult::Success { data } = result else {
            return None;
        };
        let template = data.template()?;
        Some(Self {
            id: Uuid::new_v4(),
            fingerprint_template_base64: template.to_string(),
            template_sha256: template_digest(template),
            fingerprint_device_model: data.model.clone(),
            fingerprint_device_serial: data.serial_number.clone(),
            image_quality: data.image_quality,
            nfiq: data.nfiq,
            captured_at: Utc::now(),
        })
    }
}

/// SHA-256 hex digest of a template, safe to write to logs
pub fn template_digest(template: &str) -> String {
    hex::encode(Sha256::digest(template.as_bytes()))
}
