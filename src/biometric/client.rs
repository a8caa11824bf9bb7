use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;

use super::codes;
use super::logging::{DeviceLog, DeviceLogExt, LogFacade};
use super::models::{template_digest, CaptureQuality, CaptureResult, DeviceConfig, DeviceResponse};
use super::{BiometricError, FingerprintScanner, Result};

const USER_AGENT: &str = concat!("ETD Desktop Application/", env!("CARGO_PKG_VERSION"));

/// Extra time allowed on top of the device-side capture timeout
pub const CAPTURE_TIMEOUT_BUFFER: Duration = Duration::from_secs(5);

/// Transport timeout for a connection test
pub fn test_request_timeout(test_timeout_ms: u64) -> Duration {
    Duration::from_millis(test_timeout_ms)
}

/// Transport timeout for a capture: the device timeout plus a fixed buffer
pub fn capture_request_timeout(timeout_ms: u64) -> Duration {
    Duration::from_millis(timeout_ms) + CAPTURE_TIMEOUT_BUFFER
}

/// Which call a failure belongs to; selects the wording of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ConnectionTest,
    Capture,
}

impl Operation {
    /// Prefix used by the retry executor, e.g. "Capture failed after 3 attempts"
    pub fn label(self) -> &'static str {
        match self {
            Operation::ConnectionTest => "Connection",
            Operation::Capture => "Capture",
        }
    }

    fn failure_message(self, error: &BiometricError) -> String {
        match (self, error) {
            (Operation::ConnectionTest, BiometricError::Timeout) => {
                "Connection timeout - device may not be responding".to_string()
            }
            (Operation::Capture, BiometricError::Timeout) => "Capture timeout - please try again".to_string(),
            (Operation::ConnectionTest, BiometricError::Connection(detail)) => {
                format!("Connection error - device not accessible: {}", detail)
            }
            (Operation::Capture, BiometricError::Connection(detail)) => {
                format!("Connection error during capture: {}", detail)
            }
            (Operation::ConnectionTest, BiometricError::Status(status)) => format!("HTTP error: {}", status),
            (Operation::Capture, BiometricError::Status(status)) => format!("HTTP error during capture: {}", status),
            (_, BiometricError::Json(e)) => format!("Invalid JSON response: {}", e),
            (Operation::ConnectionTest, other) => format!("Unexpected error: {}", other),
            (Operation::Capture, other) => format!("Unexpected error during capture: {}", other),
        }
    }

    fn device_error_message(self, code: i64) -> String {
        let prefix = match self {
            Operation::ConnectionTest => "Device error",
            Operation::Capture => "Capture error",
        };
        format!("{} {}: {}", prefix, code, codes::error_message(code))
    }
}

/// HTTP client for the SecuGen WebAPI `SGIFPCapture` endpoint
pub struct DeviceClient {
    config: DeviceConfig,
    http: Client,
    log: Arc<dyn DeviceLog>,
}

impl DeviceClient {
    pub fn new(config: DeviceConfig) -> Result<Self> {
        Self::with_log(config, Arc::new(LogFacade))
    }

    pub fn with_log(config: DeviceConfig, log: Arc<dyn DeviceLog>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(BiometricError::Client)?;

        log.info(&format!(
            "Initialized biometric device: {} (Serial: {})",
            config.device_name, config.serial_number
        ));

        Ok(Self { config, http, log })
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Probe the device with a short timeout. Never fails; errors come back as data.
    pub async fn test_connection(&self) -> CaptureResult {
        let op = Operation::ConnectionTest;
        let url = self.config.capture_url();
        let params = vec![
            ("Timeout", self.config.test_timeout_ms.to_string()),
            ("DeviceName", self.config.device_name.clone()),
            ("SerialNumber", self.config.serial_number.clone()),
        ];

        self.log.info(&format!("Testing biometric device connection: {}", url));
        let timeout = test_request_timeout(self.config.test_timeout_ms);

        match self.fetch(&url, &params, timeout).await {
            Ok(data) if !data.is_ok() => self.device_failure(op, data),
            Ok(data) => {
                self.log.info("Biometric device connection successful");
                CaptureResult::success(data)
            }
            Err(e) => self.transport_failure(op, &e),
        }
    }

    /// Capture a fingerprint as an ISO template
    pub async fn capture(&self, timeout_ms: Option<u64>) -> CaptureResult {
        let op = Operation::Capture;
        let timeout_ms = timeout_ms.unwrap_or(self.config.capture_timeout_ms);
        let url = self.config.capture_url();
        let params = vec![
            ("FakeDetection", "0".to_string()),
            ("Timeout", timeout_ms.to_string()),
            ("TemplateFormat", "ISO".to_string()),
            ("DeviceName", self.config.device_name.clone()),
            ("SerialNumber", self.config.serial_number.clone()),
        ];

        self.log.info(&format!("Capturing fingerprint: {}", url));

        let data = match self.fetch(&url, &params, capture_request_timeout(timeout_ms)).await {
            Ok(data) => data,
            Err(e) => return self.transport_failure(op, &e),
        };

        if !data.is_ok() {
            return self.device_failure(op, data);
        }

        // ErrorCode 0 with nothing to store is still a failed capture
        let Some(template) = data.template() else {
            self.log.warn("No fingerprint template received");
            return CaptureResult::failure("No fingerprint template received", Some(data));
        };

        let quality = CaptureQuality::from_response(&data);
        let digest = template_digest(template);
        self.log.info(&format!(
            "Fingerprint captured successfully - Quality: {}, NFIQ: {}, Template length: {}, SHA-256: {}",
            quality.image_quality, quality.nfiq, quality.template_length, &digest[..12]
        ));

        CaptureResult::success(data)
    }

    /// Issue one GET and decode the body. Transport-level failures only.
    async fn fetch(&self, url: &str, params: &[(&str, String)], timeout: Duration) -> Result<DeviceResponse> {
        self.log.debug(&format!("Request params: {:?}, timeout: {:?}", params, timeout));

        let response = self
            .http
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        self.log.debug(&format!("Response status: {}", status));
        if !status.is_success() {
            return Err(BiometricError::Status(status));
        }

        let body = response.bytes().await?;
        let data: DeviceResponse = serde_json::from_slice(&body)?;
        Ok(data)
    }

    fn device_failure(&self, op: Operation, data: DeviceResponse) -> CaptureResult {
        let message = op.device_error_message(data.error_code);
        self.log.warn(&message);
        CaptureResult::failure(message, Some(data))
    }

    fn transport_failure(&self, op: Operation, error: &BiometricError) -> CaptureResult {
        let message = op.failure_message(error);
        self.log.error(&message);
        CaptureResult::failure(message, None)
    }
}

#[async_trait::async_trait]
impl FingerprintScanner for DeviceClient {
    async fn test_connection(&self) -> CaptureResult {
        DeviceClient::test_connection(self).await
    }

    async fn capture(&self, timeout_ms: Option<u64>) -> CaptureResult {
        DeviceClient::capture(self, timeout_ms).await
    }
}
