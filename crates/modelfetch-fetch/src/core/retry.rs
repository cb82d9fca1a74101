use std::time::Duration;

/// Upper bound for [`backoff`].
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Calculate the delay before a retry attempt using exponential backoff.
///
/// The delay formula is: `base * 2^retry_count`
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use modelfetch_fetch::core::retry_delay;
///
/// assert_eq!(retry_delay(0, Duration::from_millis(100)), Duration::from_millis(100));
/// assert_eq!(retry_delay(2, Duration::from_millis(100)), Duration::from_millis(400));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    let multiplier = 2_u32.saturating_pow(retry_count);
    base.saturating_mul(multiplier)
}

/// Delay after the given 1-based failed attempt, capped at [`MAX_RETRY_DELAY`].
pub fn backoff(failed_attempt: u32, base: Duration) -> Duration {
    retry_delay(failed_attempt.saturating_sub(1), base).min(MAX_RETRY_DELAY)
}
