//! SecuGen WebAPI error codes.

/// ErrorCode value the WebAPI returns on success.
pub const SUCCESS: i64 = 0;

/// Value used when a response carries no `ErrorCode` field.
pub const MISSING_ERROR_CODE: i64 = -1;

/// Translate a device error code into a human-readable message.
pub fn error_message(code: i64) -> String {
    let message = match code {
        10001 => "No device found",
        10002 => "Device initialization failed",
        10003 => "Device busy",
        10004 => "Device error - check connection",
        10005 => "Capture timeout",
        10006 => "Poor quality fingerprint",
        10007 => "Fake finger detected",
        10008 => "Device not ready",
        10009 => "Invalid parameters",
        10010 => "Device communication error",
        other => return format!("Unknown error code: {}", other),
    };
    message.to_string()
}
