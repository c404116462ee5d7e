// Rate limiting for polling loops
use std::time::Duration;
use tokio::time::Instant;

/// Spaces consecutive executions at least `min_interval` apart,
/// measured from the start of one execution to the start of the next.
#[derive(Debug)]
pub struct FrequencyLimiter {
    min_interval: Duration,
    last_run_at: Option<Instant>,
}

impl FrequencyLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_run_at: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Sleep out whatever remains of the interval since the previous
    /// execution, then mark a new execution as started.
    pub async fn tick(&mut self) {
        if let Some(last) = self.last_run_at {
            tokio::time::sleep_until(last + self.min_interval).await;
        }
        self.last_run_at = Some(Instant::now());
    }

    /// Run `action` once the interval allows it.
    pub async fn run<F, Fut, R>(&mut self, action: F) -> R
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        self.tick().await;
        action().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_runs_are_spaced() {
        let mut limiter = FrequencyLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        let mut starts = Vec::new();
        for _ in 0..3 {
            starts.push(limiter.run(|| async move { start.elapsed() }).await);
        }
        assert_eq!(starts[0], Duration::ZERO);
        assert!(starts[1] >= Duration::from_secs(1));
        assert!(starts[2] >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_action_is_not_delayed_further() {
        let mut limiter = FrequencyLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        limiter
            .run(|| tokio::time::sleep(Duration::from_millis(1500)))
            .await;
        let second = limiter.run(|| async move { start.elapsed() }).await;
        assert_eq!(second, Duration::from_millis(1500));
    }
}
