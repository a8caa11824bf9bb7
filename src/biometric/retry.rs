use std::future::Future;
use std::sync::Arc;

use super::logging::{DeviceLog, DeviceLogExt, LogFacade};
use super::models::{CaptureResult, RetryPolicy};

/// Re-runs a single-attempt device call with linear backoff.
///
/// Every failure is retried the same way. Per-attempt errors are logged, and
/// the caller only sees the final "failed after N attempts" message.
pub struct RetryExecutor {
    policy: RetryPolicy,
    log: Arc<dyn DeviceLog>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, log: Arc<dyn DeviceLog>) -> Self {
        Self { policy, log }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Attempts actually made; a zero budget still runs once.
    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts.max(1)
    }

    /// Run `attempt` until it succeeds or the budget is spent.
    pub async fn run<F, Fut>(&self, label: &str, mut attempt: F) -> CaptureResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CaptureResult>,
    {
        let max_attempts = self.max_attempts();

        for index in 0..max_attempts {
            if index > 0 {
                let delay = self.policy.delay_before(index);
                self.log.info(&format!("Waiting {:?} before retry...", delay));
                tokio::time::sleep(delay).await;
            }

            self.log.info(&format!("{} attempt {}/{}", label, index + 1, max_attempts));
            let result = attempt().await;

            match result.error() {
                None => {
                    self.log.info(&format!("{} succeeded on attempt {}", label, index + 1));
                    return result;
                }
                Some(error) => {
                    self.log.warn(&format!("{} failed on attempt {}: {}", label, index + 1, error));
                }
            }
        }

        self.log.error(&format!("All {} attempts failed", label.to_lowercase()));
        CaptureResult::failure(format!("{} failed after {} attempts", label, max_attempts), None)
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), Arc::new(LogFacade))
    }
}
