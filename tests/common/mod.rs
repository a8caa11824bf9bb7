#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use etd_desktop_lib::biometric::{
    BiometricService, DeviceClient, DeviceConfig, DeviceLog, RetryExecutor, RetryPolicy,
};
use log::Level;
use wiremock::MockServer;

/// Keeps every line the client logs so tests can look at per-attempt detail.
#[derive(Default)]
pub struct RecordingLog {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingLog {
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(l, line)| *l == level && line.contains(needle))
    }
}

impl DeviceLog for RecordingLog {
    fn log(&self, level: Level, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

pub fn device_config(server: &MockServer) -> DeviceConfig {
    DeviceConfig {
        base_url: server.uri(),
        test_timeout_ms: 500,
        capture_timeout_ms: 1_500,
        ..DeviceConfig::default()
    }
}

pub fn client(server: &MockServer) -> (DeviceClient, Arc<RecordingLog>) {
    let log = Arc::new(RecordingLog::default());
    let client = DeviceClient::with_log(device_config(server), log.clone()).unwrap();
    (client, log)
}

pub fn service(config: DeviceConfig, attempts: u32) -> (BiometricService, Arc<RecordingLog>) {
    let log = Arc::new(RecordingLog::default());
    let client = DeviceClient::with_log(config, log.clone()).unwrap();
    let retry = RetryExecutor::new(RetryPolicy::new(attempts, Duration::from_millis(10)), log.clone());
    (BiometricService::new(Arc::new(client), retry, log.clone()), log)
}
