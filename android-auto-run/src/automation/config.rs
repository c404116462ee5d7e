// Timing configuration for polling loops
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Timeout used when a wait is given none
    pub default_timeout: Duration,
    /// Poll interval for waits up to `long_wait_after`
    pub short_interval: Duration,
    /// Poll interval for longer waits
    pub long_interval: Duration,
    pub long_wait_after: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(60),
            short_interval: Duration::from_secs(1),
            long_interval: Duration::from_secs(5),
            long_wait_after: Duration::from_secs(60),
        }
    }
}

impl WaitConfig {
    /// Minimum spacing between polls for a wait of `timeout`
    pub fn interval_for(&self, timeout: Duration) -> Duration {
        if timeout <= self.long_wait_after {
            self.short_interval
        } else {
            self.long_interval
        }
    }
}
