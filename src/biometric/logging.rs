use log::Level;

/// Log target used for all device traffic.
pub const TARGET: &str = "etd::biometric";

/// Sink for device client and retry diagnostics.
///
/// Injected at construction so callers decide where per-attempt detail goes.
pub trait DeviceLog: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

/// Forwards to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacade;

impl DeviceLog for LogFacade {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: TARGET, level, "{}", message);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl DeviceLog for NullLog {
    fn log(&self, _level: Level, _message: &str) {}
}

/// Convenience wrappers so call sites read like the `log` macros.
pub(crate) trait DeviceLogExt {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

impl<T: DeviceLog + ?Sized> DeviceLogExt for T {
    fn debug(&self, message: &str) {
        self.log(Level::Debug, message)
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message)
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message)
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message)
    }
}
