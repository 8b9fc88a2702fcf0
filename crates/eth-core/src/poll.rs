use std::time::Duration;

use crate::error::EthError;

/// Fixed-delay, bounded polling, e.g. for waiting on a transaction receipt.
///
/// There is no backoff or jitter. The number of attempts is derived from the
/// timeout so that polling never runs unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    /// Two-second interval, five-minute timeout.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(300),
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// `timeout / interval + 1`, and always at least one attempt.
    pub fn max_attempts(&self) -> u32 {
        if self.interval.is_zero() {
            return 1;
        }
        let slots = self.timeout.as_nanos() / self.interval.as_nanos();
        u32::try_from(slots).unwrap_or(u32::MAX - 1).saturating_add(1)
    }

    /// Calls `check` until it yields `Some`, sleeping `interval` between
    /// attempts.
    ///
    /// An `Err` from `check` is returned immediately. Running out of attempts
    /// yields [`EthError::Timeout`].
    pub fn wait<T, F>(&self, check: F) -> Result<T, EthError>
    where
        F: FnMut() -> Result<Option<T>, EthError>,
    {
        self.wait_with_sleep(check, std::thread::sleep)
    }

    /// [`PollPolicy::wait`] with an injectable sleep function.
    pub fn wait_with_sleep<T, F, S>(&self, mut check: F, mut sleep: S) -> Result<T, EthError>
    where
        F: FnMut() -> Result<Option<T>, EthError>,
        S: FnMut(Duration),
    {
        let attempts = self.max_attempts();

        for attempt in 1..=attempts {
            if let Some(value) = check()? {
                return Ok(value);
            }

            if attempt < attempts {
                tracing::debug!(attempt, attempts, "not ready, polling again");
                sleep(self.interval);
            }
        }

        tracing::warn!(attempts, timeout = ?self.timeout, "polling timed out");
        Err(EthError::Timeout { attempts })
    }
}
