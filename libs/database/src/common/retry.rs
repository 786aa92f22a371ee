use std::collections::hash_map::RandomState;
use std::fmt::Display;
use std::future::Future;
use std::hash::BuildHasher;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How hard a connector tries before a process gives up at startup.
///
/// Delays double after every failed attempt and are capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Shorten each delay by a random amount, at most half
    pub jitter: bool,
}

impl Default for RetryConfig {
    /// 3 retries starting at 100ms, capped at 5s, jittered.
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay_ms: u64) -> Self {
        self.initial_delay = Duration::from_millis(delay_ms);
        self
    }

    pub fn with_max_delay(mut self, delay_ms: u64) -> Self {
        self.max_delay = Duration::from_millis(delay_ms);
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Total attempts, the first one included.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Un-jittered delay before retry `retry` (1-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let doublings = retry.saturating_sub(1).min(31);
        self.initial_delay
            .saturating_mul(1u32 << doublings)
            .min(self.max_delay)
    }

    fn sleep_before(&self, retry: u32) -> Duration {
        let delay = self.delay_for_retry(retry);
        if self.jitter { jittered(delay) } else { delay }
    }
}

/// Await `connect` until it succeeds or every attempt in `config` failed,
/// returning the last error in that case. `target` only labels the logs.
pub async fn retry_with_backoff<F, Fut, T, E>(
    target: &str,
    config: &RetryConfig,
    mut connect: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let started = Instant::now();
    let mut retry = 0;

    loop {
        let error = match connect().await {
            Ok(value) => {
                if retry > 0 {
                    info!(
                        target_name = target,
                        attempts = retry + 1,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Connected after retrying"
                    );
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if retry >= config.max_retries {
            warn!(target_name = target, attempts = retry + 1, error = %error, "Giving up");
            return Err(error);
        }

        retry += 1;
        let delay = config.sleep_before(retry);
        warn!(
            target_name = target,
            retry,
            max_retries = config.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Connection attempt failed"
        );
        tokio::time::sleep(delay).await;
    }
}

/// `delay` scaled into [delay / 2, delay).
fn jittered(delay: Duration) -> Duration {
    let seed = RandomState::new().hash_one(Instant::now());
    delay.mul_f64(0.5 + (seed % 500) as f64 / 1000.0)
}
