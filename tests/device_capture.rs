mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use etd_desktop_lib::biometric::{CaptureQuality, DeviceClient, DeviceConfig, FingerprintRecord};

#[tokio::test]
async fn test_capture_sends_capture_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/SGIFPCapture"))
        .and(query_param("FakeDetection", "0"))
        .and(query_param("Timeout", "1500"))
        .and(query_param("TemplateFormat", "ISO"))
        .and(query_param("DeviceName", "HU20"))
        .and(query_param("SerialNumber", "H58220311290"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ErrorCode": 0,
            "Template": "Rk1SACAyMAAAAAFiAAABQAHgAMUAxQEAAAAoNUCXAC",
            "ImageQuality": 84,
            "NFIQ": 2,
            "Model": "HU20",
            "SerialNumber": "H58220311290",
            "Manufacturer": "SecuGen"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, log) = common::client(&server);
    let result = client.capture(None).await;

    assert!(result.is_success(), "unexpected failure: {:?}", result.error());
    let quality = CaptureQuality::from_response(result.data().unwrap());
    assert_eq!(quality.image_quality, 84);
    assert_eq!(quality.nfiq, 2);
    assert_eq!(quality.template_length, 42);

    // The template itself never reaches the log
    assert!(log.lines().iter().all(|(_, line)| !line.contains("Rk1SACAyMAAAAAF")));

    let record = FingerprintRecord::from_capture(&result).unwrap();
    assert_eq!(record.fingerprint_device_model.as_deref(), Some("HU20"));
    assert_eq!(record.template_sha256.len(), 64);
}

#[tokio::test]
async fn test_capture_explicit_timeout_overrides_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("Timeout", "10000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ErrorCode": 0, "Template": "abc" })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = common::client(&server);
    assert!(client.capture(Some(10_000)).await.is_success());
}

#[tokio::test]
async fn test_capture_empty_template_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ErrorCode": 0, "Template": "" })))
        .mount(&server)
        .await;

    let (client, _) = common::client(&server);
    let result = client.capture(None).await;

    assert_eq!(result.error(), Some("No fingerprint template received"));
    assert_eq!(result.data().map(|d| d.error_code), Some(0));
}

#[tokio::test]
async fn test_capture_missing_template_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ErrorCode": 0, "ImageQuality": 50 })))
        .mount(&server)
        .await;

    let (client, _) = common::client(&server);
    assert_eq!(client.capture(None).await.error(), Some("No fingerprint template received"));
}

#[tokio::test]
async fn test_capture_device_error_wording() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ErrorCode": 10007 })))
        .mount(&server)
        .await;

    let (client, _) = common::client(&server);
    let result = client.capture(None).await;
    assert_eq!(result.error(), Some("Capture error 10007: Fake finger detected"));
}

#[tokio::test]
async fn test_capture_http_error_wording() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (client, _) = common::client(&server);
    let result = client.capture(None).await;
    assert_eq!(result.error(), Some("HTTP error during capture: 404 Not Found"));
}

#[tokio::test]
async fn test_capture_waits_past_device_timeout() {
    // Device timeout is 1.5s; the request allows another 5s on top of it
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("Timeout", "1500"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ErrorCode": 0, "Template": "abc" }))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = common::client(&server);
    let result = client.capture(None).await;
    assert!(result.is_success(), "unexpected failure: {:?}", result.error());
}

#[tokio::test]
async fn test_capture_timeout_wording() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("Timeout", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ErrorCode": 0, "Template": "abc" }))
                .set_delay(Duration::from_millis(6_500)),
        )
        .mount(&server)
        .await;

    let (client, log) = common::client(&server);
    let result = client.capture(Some(0)).await;

    assert_eq!(result.error(), Some("Capture timeout - please try again"));
    assert!(result.data().is_none());
    assert!(log.contains(log::Level::Error, "Capture timeout"));
}

#[tokio::test]
async fn test_capture_connection_refused() {
    let config = DeviceConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        capture_timeout_ms: 500,
        ..DeviceConfig::default()
    };
    let client = DeviceClient::new(config).unwrap();
    let result = client.capture(None).await;

    let error = result.error().unwrap();
    assert!(error.starts_with("Connection error during capture:"), "{}", error);
}
