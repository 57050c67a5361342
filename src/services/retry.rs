use std::{fmt::Display, future::Future};

use tokio::time::sleep;
use tracing::warn;

use crate::config::RetryPolicy;

/// Run `operation` until it succeeds or the policy runs out of attempts.
///
/// The delay after the n-th failure is `backoff_step * n`. The last error is
/// returned untouched.
pub async fn with_linear_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    label: &'static str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    operation = label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed; retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
