use std::sync::Arc;
use tauri::State;

use crate::biometric::{BiometricService, CaptureResult, DeviceInfo, FingerprintRecord};
use crate::config::{AppConfig, BiometricSettings};

/// Shared state handed to every command
pub struct AppState {
    pub config: AppConfig,
    pub service: BiometricService,
}

impl AppState {
    pub fn new(config: AppConfig, service: BiometricService) -> Self {
        Self { config, service }
    }
}

/// Test the scanner connection, optionally through the retry executor
#[tauri::command]
pub async fn biometric_test_connection(
    retry: Option<bool>,
    state: State<'_, Arc<AppState>>,
) -> Result<CaptureResult, String> {
    let result = if retry.unwrap_or(false) {
        state.service.test_connection_with_retry().await
    } else {
        state.service.test_connection().await
    };
    Ok(result)
}

/// Capture a fingerprint
#[tauri::command]
pub async fn biometric_capture(
    timeout_ms: Option<u64>,
    retry: Option<bool>,
    state: State<'_, Arc<AppState>>,
) -> Result<CaptureResult, String> {
    let result = if retry.unwrap_or(true) {
        state.service.capture_with_retry(timeout_ms).await
    } else {
        state.service.capture(timeout_ms).await
    };
    Ok(result)
}

/// Scanner identity for the status panel
#[tauri::command]
pub async fn biometric_device_info(
    state: State<'_, Arc<AppState>>,
) -> Result<DeviceInfo, String> {
    Ok(state.service.device_info().await)
}

#[tauri::command]
pub async fn biometric_device_available(
    state: State<'_, Arc<AppState>>,
) -> Result<bool, String> {
    Ok(state.service.is_device_available().await)
}

/// Capture and convert into the record stored with the application form
#[tauri::command]
pub async fn biometric_fingerprint_record(
    timeout_ms: Option<u64>,
    state: State<'_, Arc<AppState>>,
) -> Result<FingerprintRecord, String> {
    let result = state.service.capture_with_retry(timeout_ms).await;
    if let Some(error) = result.error() {
        return Err(error.to_string());
    }

    let record = FingerprintRecord::from_capture(&result)
        .ok_or_else(|| "No fingerprint template received".to_string())?;
    log::info!(
        "Fingerprint record {} created (template SHA-256 {})",
        record.id,
        record.template_sha256
    );
    Ok(record)
}

/// Scanner settings the form displays
#[tauri::command]
pub async fn get_biometric_config(
    state: State<'_, Arc<AppState>>,
) -> Result<BiometricSettings, String> {
    Ok(state.config.biometric.clone())
}
