//! Transport retry policy.

use std::time::Duration;

/// Which failures [`HttpConnection`](super::HttpConnection) retries, and how
/// long it waits in between.
///
/// Retries are the transport's business only: query execution and token
/// refresh see a single outcome per request. The wait doubles with every
/// attempt, capped at `max_delay`; a `Retry-After` header on a 429 response
/// takes precedence.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use fortify_lib::transport::RetryConfig;
///
/// let config = RetryConfig::default()
///     .max_retries(5)
///     .initial_delay(Duration::from_millis(500));
/// assert_eq!(config.delay_for(0), Duration::from_millis(500));
/// assert_eq!(config.delay_for(2), Duration::from_secs(2));
///
/// assert!(!RetryConfig::no_retry().can_retry(0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Wait before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any wait.
    pub max_delay: Duration,
    /// Retry HTTP 429 responses.
    pub retry_on_429: bool,
    /// Retry HTTP 5xx responses.
    pub retry_on_5xx: bool,
    /// Retry connection failures and timeouts.
    pub retry_on_network: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            retry_on_429: true,
            retry_on_5xx: true,
            retry_on_network: true,
        }
    }
}

impl RetryConfig {
    /// Every request is attempted exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            retry_on_429: false,
            retry_on_5xx: false,
            retry_on_network: false,
            ..Default::default()
        }
    }

    /// Sets the maximum number of retries.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Sets the wait before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the upper bound for any wait.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enables or disables retry on HTTP 429.
    pub fn retry_on_429(mut self, enabled: bool) -> Self {
        self.retry_on_429 = enabled;
        self
    }

    /// Enables or disables retry on HTTP 5xx.
    pub fn retry_on_5xx(mut self, enabled: bool) -> Self {
        self.retry_on_5xx = enabled;
        self
    }

    /// Enables or disables retry on network errors.
    pub fn retry_on_network(mut self, enabled: bool) -> Self {
        self.retry_on_network = enabled;
        self
    }

    /// Returns `true` if another attempt is allowed after `attempts` retries.
    pub fn can_retry(&self, attempts: u32) -> bool {
        attempts < self.max_retries
    }

    /// Wait before retry number `attempt` (zero based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let config = RetryConfig::default();
        let delays: Vec<_> = (0..7).map(|n| config.delay_for(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30]);
        assert_eq!(config.delay_for(64), Duration::from_secs(30));
    }

    #[test]
    fn test_retry_budget() {
        let config = RetryConfig::default().max_retries(2);
        assert!(config.can_retry(0));
        assert!(config.can_retry(1));
        assert!(!config.can_retry(2));
    }
}
