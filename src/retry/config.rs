//! Retry configuration and the executor builder.

use std::time::Duration;

use super::executor::RetryExecutor;
use super::outcome::Outcome;

/// Attempts made when none are configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Fixed delay between two attempts when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

/// Configuration snapshot used by a [`RetryExecutor`].
///
/// A config is pure data: it decides *whether* another attempt follows, it
/// never runs anything. Build one through [`RetryExecutorBuilder`] or
/// [`RetryConfig::try_new`]; both enforce the invariants.
///
/// # Invariants
///
/// - `max_attempts >= 1`
/// - `timeout`, when set, is greater than zero
///
/// The interval between attempts is fixed. It never grows from one attempt
/// to the next.
///
/// # Examples
///
/// ```rust
/// use steadfast::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::try_new(3, Some(Duration::from_secs(1)), Duration::from_millis(10))
///     .unwrap();
///
/// assert_eq!(config.max_attempts(), 3);
/// assert_eq!(config.timeout(), Some(Duration::from_secs(1)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryConfig {
    max_attempts: u32,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "timeout_ms", with = "millis::option")
    )]
    timeout: Option<Duration>,
    #[cfg_attr(feature = "serde", serde(rename = "interval_ms", with = "millis"))]
    interval: Duration,
}

/// Where the retry loop goes after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// An attempt is running.
    Attempting,
    /// The attempt succeeded. Terminal.
    Succeeded,
    /// The attempt failed and another one follows after the interval.
    RetryWait,
    /// The attempt failed and no attempts remain. Terminal.
    Exhausted,
}

impl RetryState {
    /// Returns true for `Succeeded` and `Exhausted`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Exhausted)
    }
}

/// Error returned when a configuration value is out of range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidConfig {
    /// The attempt count was zero, negative, or too large.
    MaxAttempts(i64),
    /// The timeout was zero or negative.
    Timeout {
        /// The rejected timeout in milliseconds.
        millis: i64,
    },
}

impl std::fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MaxAttempts(n) => {
                write!(f, "max attempts must be a positive integer, got {}", n)
            }
            Self::Timeout { millis } => {
                write!(f, "timeout must be greater than zero, got {}ms", millis)
            }
        }
    }
}

impl std::error::Error for InvalidConfig {}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: None,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl RetryConfig {
    /// Create a config, checking every invariant.
    pub fn try_new(
        max_attempts: u32,
        timeout: Option<Duration>,
        interval: Duration,
    ) -> Result<Self, InvalidConfig> {
        let config = Self {
            max_attempts,
            timeout,
            interval,
        };
        config.validate()?;
        Ok(config)
    }

    /// Total number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Per-attempt deadline, or `None` when attempts run unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Delay between a failed attempt and the next one.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Check the invariants.
    ///
    /// Configs deserialized with the `serde` feature skip the builder, so
    /// they must pass through here before use.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.max_attempts == 0 {
            return Err(InvalidConfig::MaxAttempts(0));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(InvalidConfig::Timeout { millis: 0 });
        }
        Ok(())
    }

    /// Decide the next state after `attempt` (1-indexed) produced `outcome`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use steadfast::{AttemptError, Outcome, RetryConfig, RetryState};
    /// use std::time::Duration;
    ///
    /// let config = RetryConfig::try_new(2, None, Duration::ZERO).unwrap();
    /// let failed: Outcome<(), &str> = Outcome::Failure(AttemptError::Execution("boom"));
    ///
    /// assert_eq!(config.transition(1, &failed), RetryState::RetryWait);
    /// assert_eq!(config.transition(2, &failed), RetryState::Exhausted);
    /// assert_eq!(config.transition(2, &Outcome::<(), &str>::Success(())), RetryState::Succeeded);
    /// ```
    pub fn transition<T, E>(&self, attempt: u32, outcome: &Outcome<T, E>) -> RetryState {
        if outcome.is_success() {
            RetryState::Succeeded
        } else if attempt >= self.max_attempts {
            RetryState::Exhausted
        } else {
            RetryState::RetryWait
        }
    }
}

/// Builder for [`RetryExecutor`].
///
/// Each builder owns its own settings; two builders never observe each
/// other's configuration.
///
/// # Examples
///
/// ```rust
/// use steadfast::RetryExecutor;
/// use std::time::Duration;
///
/// let executor = RetryExecutor::builder()
///     .with_max_attempts(3)?
///     .with_timeout(Duration::from_millis(500))?
///     .with_interval(Duration::from_millis(10))
///     .build();
///
/// assert_eq!(executor.max_attempts(), 3);
/// # Ok::<(), steadfast::InvalidConfig>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RetryExecutorBuilder {
    config: RetryConfig,
}

impl RetryExecutorBuilder {
    /// Start from the defaults: one attempt, no timeout, 5 second interval.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing config, validating it first.
    pub fn from_config(config: RetryConfig) -> Result<Self, InvalidConfig> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Set the total number of attempts.
    ///
    /// Fails with [`InvalidConfig::MaxAttempts`] when `n <= 0`.
    ///
    /// ```rust
    /// use steadfast::{InvalidConfig, RetryExecutor};
    ///
    /// assert_eq!(
    ///     RetryExecutor::builder().with_max_attempts(0).unwrap_err(),
    ///     InvalidConfig::MaxAttempts(0)
    /// );
    /// ```
    pub fn with_max_attempts(mut self, n: i64) -> Result<Self, InvalidConfig> {
        let attempts = u32::try_from(n)
            .ok()
            .filter(|&a| a > 0)
            .ok_or(InvalidConfig::MaxAttempts(n))?;
        self.config.max_attempts = attempts;
        Ok(self)
    }

    /// Bound each attempt by `timeout`.
    ///
    /// Fails with [`InvalidConfig::Timeout`] when `timeout` is zero.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, InvalidConfig> {
        if timeout.is_zero() {
            return Err(InvalidConfig::Timeout { millis: 0 });
        }
        self.config.timeout = Some(timeout);
        Ok(self)
    }

    /// Bound each attempt by a timeout given in milliseconds.
    ///
    /// Fails with [`InvalidConfig::Timeout`] when `millis <= 0`.
    pub fn with_timeout_millis(self, millis: i64) -> Result<Self, InvalidConfig> {
        match u64::try_from(millis) {
            Ok(ms) if ms > 0 => self.with_timeout(Duration::from_millis(ms)),
            _ => Err(InvalidConfig::Timeout { millis }),
        }
    }

    /// Set the fixed delay between attempts.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// The configuration accumulated so far.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Build an executor from a snapshot of the current configuration.
    ///
    /// The builder stays usable; later changes do not affect executors that
    /// were already built.
    pub fn build(&self) -> RetryExecutor {
        RetryExecutor::new(self.config.clone())
    }
}

#[cfg(feature = "serde")]
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            duration: &Option<Duration>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match duration {
                Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<Duration>, D::Error> {
            Option::<u64>::deserialize(d).map(|ms| ms.map(Duration::from_millis))
        }
    }
}
