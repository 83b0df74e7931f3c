use quarry_core::PacingConfig;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Randomized delay between consecutive requests of one account.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    min: Duration,
    max: Duration,
}

impl Pacer {
    /// Delays drawn uniformly from `min..=max`. The bounds are swapped if
    /// given in the wrong order.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(
            Duration::from_secs_f64(config.min_delay_secs.max(0.0)),
            Duration::from_secs_f64(config.max_delay_secs.max(0.0)),
        )
    }

    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = rand::thread_rng().gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Wait one randomized interval.
    ///
    /// Returns false if `cancel` fired before the interval elapsed.
    pub async fn pause(&self, cancel: &CancellationToken) -> bool {
        let delay = self.next_delay();
        debug!(delay_ms = delay.as_millis(), "pacing before next request");

        tokio::select! {
            () = cancel.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_delay_stays_in_range() {
        let pacer = Pacer::from_config(&PacingConfig {
            min_delay_secs: 30.0,
            max_delay_secs: 33.5,
        });
        for _ in 0..200 {
            let delay = pacer.next_delay();
            assert!(delay >= Duration::from_secs(30));
            assert!(delay <= Duration::from_millis(33_500));
        }
    }

    #[test]
    fn test_inverted_bounds_are_swapped() {
        let pacer = Pacer::new(Duration::from_secs(5), Duration::from_secs(1));
        let delay = pacer.next_delay();
        assert!(delay >= Duration::from_secs(1) && delay <= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_waits_for_the_delay() {
        let pacer = Pacer::new(Duration::from_secs(30), Duration::from_secs(30));
        let start = Instant::now();
        assert!(pacer.pause(&CancellationToken::new()).await);
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_is_cancellable() {
        let pacer = Pacer::new(Duration::from_secs(30), Duration::from_secs(30));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let start = Instant::now();
        assert!(!pacer.pause(&cancel).await);
        assert!(start.elapsed() < Duration::from_secs(30));
    }
}
