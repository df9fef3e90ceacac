//! Webhook delivery settings.

use std::env;
use std::time::Duration;

use unison_core::config::{duration_ms_var, parse_value, parse_var};
use unison_core::ConfigError;

/// Default broadcast channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Default delivery attempts per endpoint (initial + retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay before each retry: 1s, 5s, 30s, 2min.
pub const DEFAULT_BACKOFF_MS: [u64; 4] = [1_000, 5_000, 30_000, 120_000];

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How webhooks are queued and delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSettings {
    pub channel_capacity: usize,
    pub max_attempts: u32,
    /// Delay before retry `n` is `backoff[n - 1]`; the last entry repeats.
    pub backoff: Vec<Duration>,
    pub timeout: Duration,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF_MS.iter().copied().map(Duration::from_millis).collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl WebhookSettings {
    /// Load settings from the environment.
    ///
    /// - `UNISON_WEBHOOK_CHANNEL_CAPACITY` (default 1024, at least 1)
    /// - `UNISON_WEBHOOK_MAX_ATTEMPTS` (default 5, at least 1)
    /// - `UNISON_WEBHOOK_BACKOFF_MS` comma list (default `1000,5000,30000,120000`)
    /// - `UNISON_WEBHOOK_TIMEOUT_MS` (default 10000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let channel_capacity = parse_var("UNISON_WEBHOOK_CHANNEL_CAPACITY", defaults.channel_capacity)?;
        if channel_capacity == 0 {
            return Err(ConfigError::invalid("UNISON_WEBHOOK_CHANNEL_CAPACITY", "must be at least 1"));
        }

        let max_attempts = parse_var("UNISON_WEBHOOK_MAX_ATTEMPTS", defaults.max_attempts)?;
        if max_attempts == 0 {
            return Err(ConfigError::invalid("UNISON_WEBHOOK_MAX_ATTEMPTS", "must be at least 1"));
        }

        let backoff = match env::var("UNISON_WEBHOOK_BACKOFF_MS") {
            Ok(raw) => parse_backoff("UNISON_WEBHOOK_BACKOFF_MS", &raw)?,
            Err(_) => defaults.backoff,
        };

        Ok(Self {
            channel_capacity,
            max_attempts,
            backoff,
            timeout: duration_ms_var("UNISON_WEBHOOK_TIMEOUT_MS", defaults.timeout)?,
        })
    }

    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let idx = retry.saturating_sub(1) as usize;
        self.backoff
            .get(idx)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or_default()
    }
}

/// Parse a comma-separated list of milliseconds.
pub fn parse_backoff(var: &str, raw: &str) -> Result<Vec<Duration>, ConfigError> {
    let delays = raw
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_value::<u64>(var, part).map(Duration::from_millis))
        .collect::<Result<Vec<_>, _>>()?;
    if delays.is_empty() {
        return Err(ConfigError::invalid(var, "must list at least one delay"));
    }
    Ok(delays)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backoff() {
        assert_eq!(
            parse_backoff("V", "10, 20,30").unwrap(),
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(30)
            ]
        );
        assert!(parse_backoff("V", "").is_err());
        assert!(parse_backoff("V", "10,soon").is_err());
    }

    #[test]
    fn test_last_delay_repeats() {
        let settings = WebhookSettings::default();
        assert_eq!(settings.delay_before_retry(1), Duration::from_secs(1));
        assert_eq!(settings.delay_before_retry(4), Duration::from_secs(120));
        assert_eq!(settings.delay_before_retry(9), Duration::from_secs(120));
    }
}
