//! Fixed-interval send pacing

use std::time::Duration;

/// Spaces successful sends evenly: after each one the pipeline waits
/// `60 / per_minute` seconds. No burst allowance, no adaptive backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendPacer {
    delay: Option<Duration>,
}

impl SendPacer {
    /// Pacer for `per_minute` sends per minute; `0` disables pacing
    pub fn per_minute(per_minute: u32) -> Self {
        let delay = (per_minute > 0).then(|| Duration::from_secs_f64(60.0 / f64::from(per_minute)));
        Self { delay }
    }

    /// Pacer that never waits
    pub fn disabled() -> Self {
        Self { delay: None }
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    pub fn is_enabled(&self) -> bool {
        self.delay.is_some()
    }

    /// Wait out the post-send interval
    pub async fn pause(&self) {
        if let Some(delay) = self.delay {
            tracing::trace!(delay_ms = delay.as_millis() as u64, "Pacing after send");
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for SendPacer {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_from_rate() {
        assert_eq!(SendPacer::per_minute(30).delay(), Some(Duration::from_secs(2)));
        assert_eq!(SendPacer::per_minute(60).delay(), Some(Duration::from_secs(1)));
        assert_eq!(SendPacer::per_minute(120).delay(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_zero_rate_disables() {
        let pacer = SendPacer::per_minute(0);
        assert!(!pacer.is_enabled());
        assert_eq!(pacer, SendPacer::disabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_waits_full_interval() {
        let pacer = SendPacer::per_minute(6);
        let start = tokio::time::Instant::now();
        pacer.pause().await;
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_pause_returns_immediately() {
        let start = tokio::time::Instant::now();
        SendPacer::disabled().pause().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
