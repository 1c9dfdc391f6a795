use crate::api::error::Transient;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(2000);

/// Exponential backoff for transient service failures.
///
/// The delay doubles after every retry with no jitter and no ceiling, so the
/// default policy waits 2s, 4s, 8s before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Run `operation`, retrying while it fails with a transient error.
    /// The last error is returned unchanged once retries run out.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        E: Transient + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut retries_left = self.max_retries;
        let mut delay = self.initial_delay;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if retries_left > 0 && e.is_transient() => {
                    warn!(
                        "Rate limit hit ({}). Retrying in {}ms... ({} retries left)",
                        e,
                        delay.as_millis(),
                        retries_left
                    );
                    tokio::time::sleep(delay).await;
                    retries_left -= 1;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Retry `operation` with an explicit budget and starting delay
pub async fn with_retry<T, E, F, Fut>(
    operation: F,
    max_retries: u32,
    initial_delay: Duration,
) -> Result<T, E>
where
    E: Transient + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    RetryPolicy::new(max_retries, initial_delay)
        .run(operation)
        .await
}
