//! Pool configuration options

use std::time::{Duration, Instant};

use crate::errors::{PoolError, PoolResult};

/// Default name given to the background reclaimer thread.
pub const DEFAULT_RECLAIMER_THREAD_NAME: &str = "expiring-pool-reclaimer";

/// Configuration for expiring pool behavior
///
/// # Examples
///
/// ```
/// use expiring_objpool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new(Duration::from_millis(250))
///     .with_timeout(Duration::from_secs(5))
///     .with_poll_interval(Duration::from_millis(2))
///     .with_thread_name("buffers-reclaimer");
///
/// assert_eq!(config.time_to_live, Duration::from_millis(250));
/// assert_eq!(config.operation_timeout, Some(Duration::from_secs(5)));
/// assert_eq!(config.reclaimer_thread_name, "buffers-reclaimer");
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfiguration {
    /// How long an object may sit unused in the pool before it is discarded
    pub time_to_live: Duration,

    /// Timeout for async operations
    pub operation_timeout: Option<Duration>,

    /// How often async retrieval re-checks an empty pool
    pub poll_interval: Duration,

    /// Name of the background reclaimer thread
    pub reclaimer_thread_name: String,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            time_to_live: Duration::from_secs(60),
            operation_timeout: Some(Duration::from_secs(30)),
            poll_interval: Duration::from_millis(10),
            reclaimer_thread_name: DEFAULT_RECLAIMER_THREAD_NAME.to_string(),
        }
    }
}

impl PoolConfiguration {
    /// Create a configuration with the given time-to-live and defaults for everything else
    pub fn new(time_to_live: Duration) -> Self {
        Self {
            time_to_live,
            ..Self::default()
        }
    }

    /// Set the time-to-live applied to every pooled object
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.time_to_live = ttl;
        self
    }

    /// Set operation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Set the polling period used by async retrieval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the reclaimer thread name
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.reclaimer_thread_name = name.into();
        self
    }

    pub(crate) fn validate(&self) -> PoolResult<()> {
        if self.poll_interval.is_zero() {
            return Err(PoolError::InvalidConfiguration(
                "poll interval must be non-zero".to_string(),
            ));
        }

        if Instant::now().checked_add(self.time_to_live).is_none() {
            return Err(PoolError::InvalidConfiguration(format!(
                "time-to-live {:?} does not fit in a deadline",
                self.time_to_live
            )));
        }

        Ok(())
    }
}
