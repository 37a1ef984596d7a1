use std::time::Duration;

/// How long the loop waits before the next `open` after a source failure.
///
/// The delay is fixed and attempts are unbounded: a camera feed is expected
/// to come back on its own (reboot, network blip).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    backoff: Duration,
}

impl ReconnectPolicy {
    pub fn fixed(backoff: Duration) -> Self {
        Self { backoff }
    }

    pub fn delay(&self, _attempt: u64) -> Duration {
        self.backoff
    }

    /// Never gives up
    pub fn should_retry(&self, _attempt: u64) -> bool {
        true
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(500))
    }
}
