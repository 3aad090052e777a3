//! Configuration for the docstore client

use crate::context::DEFAULT_CALL_TIMEOUT;
use crate::error::ConfigError;
use docstore_core::{RetryInterval, RetryPolicy};
use std::time::Duration;

/// Default attempt budget per operation.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Database every operation targets
    pub database: String,

    /// Maximum attempts per operation, including the first
    pub max_retries: u32,

    /// Substrings that mark a store error as retryable
    pub retryable_errors: Vec<String>,

    /// Deadline for contexts created by [`Client::call_context`](crate::Client::call_context)
    pub call_timeout: Duration,

    /// Delay policy between attempts
    pub retry_interval: RetryInterval,

    /// Whether to wait `retry_interval` between attempts
    pub sleep_between_attempts: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database: String::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            retryable_errors: Vec::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            retry_interval: RetryInterval::default(),
            sleep_between_attempts: false,
        }
    }
}

impl ClientConfig {
    /// Configuration targeting `database` with default retry settings.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Default::default()
        }
    }

    /// Set the attempt budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the retryable error substrings.
    pub fn with_retryable_errors<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable_errors = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the default call deadline.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set the delay policy between attempts.
    pub fn with_retry_interval(mut self, interval: RetryInterval) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Wait between attempts instead of retrying immediately.
    pub fn with_sleep_between_attempts(mut self, enabled: bool) -> Self {
        self.sleep_between_attempts = enabled;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Only the process environment is read; see
    /// [`from_env_file`](Self::from_env_file) to load a `.env` file first.
    /// Recognized variables:
    /// - `DOCSTORE_DATABASE`
    /// - `DOCSTORE_MAX_RETRIES`
    /// - `DOCSTORE_RETRYABLE_ERRORS`, comma-separated substrings
    /// - `DOCSTORE_CALL_TIMEOUT_SECS`
    /// - `DOCSTORE_RETRY_INTERVAL_SECS`, step of the linear interval
    /// - `DOCSTORE_RETRY_SLEEP`, `true`/`false`
    ///
    /// Unset variables keep their defaults; malformed values are an error.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self, ConfigError> {
        use std::env;

        let mut config = Self::default();

        if let Ok(database) = env::var("DOCSTORE_DATABASE") {
            config.database = database;
        }

        if let Some(max_retries) = env_value::<u32>("DOCSTORE_MAX_RETRIES")? {
            config.max_retries = max_retries;
        }

        if let Ok(patterns) = env::var("DOCSTORE_RETRYABLE_ERRORS") {
            config.retryable_errors = patterns
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(secs) = env_value::<u64>("DOCSTORE_CALL_TIMEOUT_SECS")? {
            config.call_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = env_value::<u64>("DOCSTORE_RETRY_INTERVAL_SECS")? {
            config.retry_interval = RetryInterval::Linear {
                step: Duration::from_secs(secs),
            };
        }

        if let Ok(raw) = env::var("DOCSTORE_RETRY_SLEEP") {
            config.sleep_between_attempts = parse_flag(&raw).ok_or(ConfigError::InvalidValue {
                key: "DOCSTORE_RETRY_SLEEP",
                value: raw.clone(),
            })?;
        }

        Ok(config)
    }

    /// Load the dotenv file at `path` into the process environment, then
    /// read it like [`from_env`](Self::from_env).
    ///
    /// Variables already set in the process win over the file. A missing or
    /// unparsable file is an error.
    #[cfg(feature = "env")]
    pub fn from_env_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        dotenvy::from_path(path).map_err(|err| ConfigError::EnvFile {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_env()
    }

    /// Check the configuration can build a client.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingDatabase);
        }
        if self.max_retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        Ok(())
    }

    /// Retry policy described by this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_attempts(self.max_retries)
            .retryable_errors(self.retryable_errors.iter().cloned())
            .interval(self.retry_interval.clone())
            .sleep_between_attempts(self.sleep_between_attempts)
            .build()
    }
}

#[cfg(feature = "env")]
fn env_value<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(None);
    };
    let parsed = raw.trim().parse::<T>();
    parsed
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue { key, value: raw })
}

#[cfg(feature = "env")]
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
