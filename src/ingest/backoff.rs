//! Exponential backoff for rate-limited requests

use crate::config::DownloadConfig;
use crate::error::{ResearchError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Doubling delay capped at `max`; reset after every successful request
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: u32,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, multiplier: u32) -> Self {
        Self {
            initial,
            max,
            multiplier: multiplier.max(1),
            current: initial,
        }
    }

    pub fn from_config(config: &DownloadConfig) -> Self {
        Self::new(
            Duration::from_secs(config.initial_backoff_secs),
            Duration::from_secs(config.max_backoff_secs),
            config.backoff_multiplier,
        )
    }

    /// No waiting at all; used by tests
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, 2)
    }

    /// Delay to wait now; advances the schedule
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * self.multiplier).min(self.max);
        delay
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Run `op`, sleeping and retrying while it reports [`ResearchError::RateLimited`].
/// Any other error, or running out of retries, is returned to the caller.
pub async fn retry_rate_limited<T, F, Fut>(
    backoff: &mut Backoff,
    max_retries: u32,
    what: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts = 0u32;
    loop {
        match op().await {
            Ok(value) => {
                backoff.reset();
                return Ok(value);
            }
            Err(ResearchError::RateLimited(msg)) => {
                if attempts >= max_retries {
                    return Err(ResearchError::RateLimited(format!(
                        "{} (gave up after {} retries)",
                        msg, attempts
                    )));
                }
                let delay = backoff.next_delay();
                warn!("Rate limited on {}. Waiting {:?}...", what, delay);
                tokio::time::sleep(delay).await;
                attempts += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
