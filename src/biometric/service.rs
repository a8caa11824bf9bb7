use std::sync::Arc;

use super::client::{DeviceClient, Operation};
use super::logging::{DeviceLog, DeviceLogExt, LogFacade};
use super::models::{CaptureResult, DeviceConfig, DeviceInfo, RetryPolicy};
use super::retry::RetryExecutor;
use super::{FingerprintScanner, Result};

/// Device operations as the form uses them: single attempts, retried
/// attempts, and the status panel helpers.
pub struct BiometricService {
    scanner: Arc<dyn FingerprintScanner>,
    retry: RetryExecutor,
    log: Arc<dyn DeviceLog>,
}

impl BiometricService {
    pub fn new(scanner: Arc<dyn FingerprintScanner>, retry: RetryExecutor, log: Arc<dyn DeviceLog>) -> Self {
        Self { scanner, retry, log }
    }

    /// Build a service around an HTTP device client
    pub fn from_config(device: DeviceConfig, policy: RetryPolicy) -> Result<Self> {
        Self::with_log(device, policy, Arc::new(LogFacade))
    }

    pub fn with_log(device: DeviceConfig, policy: RetryPolicy, log: Arc<dyn DeviceLog>) -> Result<Self> {
        let client = DeviceClient::with_log(device, log.clone())?;
        Ok(Self::new(
            Arc::new(client),
            RetryExecutor::new(policy, log.clone()),
            log,
        ))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.policy()
    }

    pub async fn test_connection(&self) -> CaptureResult {
        self.scanner.test_connection().await
    }

    pub async fn capture(&self, timeout_ms: Option<u64>) -> CaptureResult {
        self.scanner.capture(timeout_ms).await
    }

    pub async fn test_connection_with_retry(&self) -> CaptureResult {
        let scanner = self.scanner.as_ref();
        self.retry
            .run(Operation::ConnectionTest.label(), move || scanner.test_connection())
            .await
    }

    pub async fn capture_with_retry(&self, timeout_ms: Option<u64>) -> CaptureResult {
        let scanner = self.scanner.as_ref();
        self.retry
            .run(Operation::Capture.label(), move || scanner.capture(timeout_ms))
            .await
    }

    /// Scanner identity for the status panel, probed through the retry executor
    pub async fn device_info(&self) -> DeviceInfo {
        let result = self.test_connection_with_retry().await;
        let info = DeviceInfo::from_result(&result);
        self.log.info(&format!(
            "Device info: {} {} ({:?})",
            info.model, info.serial_number, info.connection_status
        ));
        info
    }

    /// True when a single connection test succeeds
    pub async fn is_device_available(&self) -> bool {
        self.test_connection().await.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biometric::logging::NullLog;
    use crate::biometric::models::{ConnectionStatus, DeviceResponse};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays canned results in order, repeating the last one.
    struct ScriptedScanner {
        results: Mutex<Vec<CaptureResult>>,
        captures: Mutex<Vec<Option<u64>>>,
    }

    impl ScriptedScanner {
        fn new(mut results: Vec<CaptureResult>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                captures: Mutex::new(Vec::new()),
            }
        }

        fn next(&self) -> CaptureResult {
            let mut results = self.results.lock().unwrap();
            if results.len() > 1 {
                results.pop().unwrap()
            } else {
                results[0].clone()
            }
        }
    }

    #[async_trait::async_trait]
    impl FingerprintScanner for ScriptedScanner {
        async fn test_connection(&self) -> CaptureResult {
            self.next()
        }

        async fn capture(&self, timeout_ms: Option<u64>) -> CaptureResult {
            self.captures.lock().unwrap().push(timeout_ms);
            self.next()
        }
    }

    fn service(scanner: Arc<ScriptedScanner>) -> BiometricService {
        let log: Arc<dyn DeviceLog> = Arc::new(NullLog);
        BiometricService::new(
            scanner,
            RetryExecutor::new(RetryPolicy::new(3, Duration::from_millis(1)), log.clone()),
            log,
        )
    }

    fn device_ok() -> CaptureResult {
        let data: DeviceResponse = serde_json::from_value(serde_json::json!({
            "ErrorCode": 0,
            "Model": "HU20",
            "SerialNumber": "H58220311290",
            "Manufacturer": "SecuGen"
        }))
        .unwrap();
        CaptureResult::success(data)
    }

    #[tokio::test]
    async fn test_capture_with_retry_passes_timeout() {
        let scanner = Arc::new(ScriptedScanner::new(vec![
            CaptureResult::failure("Capture timeout - please try again", None),
            device_ok(),
        ]));
        let result = service(scanner.clone()).capture_with_retry(Some(10_000)).await;

        assert!(result.is_success());
        assert_eq!(*scanner.captures.lock().unwrap(), vec![Some(10_000), Some(10_000)]);
    }

    #[tokio::test]
    async fn test_device_info_connected() {
        let scanner = Arc::new(ScriptedScanner::new(vec![device_ok()]));
        let info = service(scanner).device_info().await;

        assert_eq!(info.connection_status, ConnectionStatus::Connected);
        assert_eq!(info.model, "HU20");
        assert_eq!(info.manufacturer, "SecuGen");
        assert_eq!(info.version, "Unknown");
    }

    #[tokio::test]
    async fn test_device_info_disconnected_reports_exhaustion() {
        let scanner = Arc::new(ScriptedScanner::new(vec![CaptureResult::failure(
            "Device error 10001: No device found",
            None,
        )]));
        let info = service(scanner).device_info().await;

        assert_eq!(info.connection_status, ConnectionStatus::Disconnected);
        assert_eq!(info.error.as_deref(), Some("Connection failed after 3 attempts"));
    }

    #[tokio::test]
    async fn test_availability_uses_single_attempt() {
        let scanner = Arc::new(ScriptedScanner::new(vec![
            CaptureResult::failure("Device busy", None),
            device_ok(),
        ]));
        let svc = service(scanner);
        assert!(!svc.is_device_available().await);
        assert!(svc.is_device_available().await);
    }
}
