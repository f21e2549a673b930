//! Exponential back-off with jitter for upstream page calls.
//!
//! Whether an error is worth another attempt is decided by
//! [`PlacesError::is_transient`]; everything else is returned at once.

use std::future::Future;
use std::time::Duration;

use bizfinder_places::PlacesError;

const MAX_DELAY: Duration = Duration::from_secs(60);

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors.
///
/// Back-off schedule with `backoff_base = 1 s`:
///
/// | Retry | Sleep before it            |
/// |-------|----------------------------|
/// | 1     | 1 s × 2⁰ ± 25 % jitter     |
/// | 2     | 1 s × 2¹ ± 25 % jitter     |
/// | 3     | 1 s × 2² ± 25 % jitter     |
///
/// Delay is capped at 60 s. When retries run out the last error is
/// returned.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base: Duration,
    mut operation: F,
) -> Result<T, PlacesError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PlacesError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = backoff_delay(backoff_base, attempt);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient places error, retrying after back-off"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let computed = base.saturating_mul(1u32 << (attempt.saturating_sub(1)).min(10));
    let capped = computed.min(MAX_DELAY);
    capped.mul_f64(rand::random::<f64>() * 0.5 + 0.75)
}
