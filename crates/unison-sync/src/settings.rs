//! Sync settings and per-call options.

use std::time::Duration;

use unison_core::config::{bool_var, duration_ms_var, parse_var};
use unison_core::ConfigError;

/// Default bound on the provider call.
pub const DEFAULT_REMOTE_DEADLINE: Duration = Duration::from_secs(30);

/// Default number of batch elements synced at once.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;

/// Service-wide sync settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub remote_deadline: Duration,
    pub batch_concurrency: usize,
    pub include_remote_data: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            remote_deadline: DEFAULT_REMOTE_DEADLINE,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            include_remote_data: false,
        }
    }
}

impl SyncSettings {
    /// Load settings from the environment.
    ///
    /// - `UNISON_REMOTE_DEADLINE_MS` (default 30000)
    /// - `UNISON_BATCH_CONCURRENCY` (default 8, at least 1)
    /// - `UNISON_INCLUDE_REMOTE_DATA` (default false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let batch_concurrency = parse_var("UNISON_BATCH_CONCURRENCY", defaults.batch_concurrency)?;
        if batch_concurrency == 0 {
            return Err(ConfigError::invalid("UNISON_BATCH_CONCURRENCY", "must be at least 1"));
        }

        Ok(Self {
            remote_deadline: duration_ms_var("UNISON_REMOTE_DEADLINE_MS", defaults.remote_deadline)?,
            batch_concurrency,
            include_remote_data: bool_var("UNISON_INCLUDE_REMOTE_DATA", defaults.include_remote_data)?,
        })
    }

    /// Per-call options defaulted from these settings.
    #[must_use]
    pub fn options(&self) -> SyncOptions {
        SyncOptions {
            deadline: self.remote_deadline,
            include_remote_data: self.include_remote_data,
        }
    }
}

/// Options for one sync call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Bound on the provider call; on expiry nothing is written.
    pub deadline: Duration,
    /// Return the raw provider payload with the result.
    pub include_remote_data: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncSettings::default().options()
    }
}

impl SyncOptions {
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_remote_data(mut self, include: bool) -> Self {
        self.include_remote_data = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_follow_settings() {
        let settings = SyncSettings {
            remote_deadline: Duration::from_millis(250),
            include_remote_data: true,
            ..SyncSettings::default()
        };
        let options = settings.options();
        assert_eq!(options.deadline, Duration::from_millis(250));
        assert!(options.include_remote_data);

        let options = options.with_deadline(Duration::from_secs(1)).with_remote_data(false);
        assert_eq!(options.deadline, Duration::from_secs(1));
        assert!(!options.include_remote_data);
    }
}
