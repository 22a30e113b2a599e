use log::{debug, warn};
use std::thread::sleep;
use std::time::Duration;

pub const TRANSFER_ATTEMPTS: u32 = 5;
pub const RETRY_DELAY: Duration = Duration::from_millis(50);

/// Controls how often a single control transfer is reattempted before giving up.
///
/// The policy knows nothing about outlets, it simply reruns a fallible USB
/// operation. Retries never span more than one transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: TRANSFER_ATTEMPTS,
            delay: RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn run<T, F>(&self, operation: F) -> Result<T, rusb::Error>
    where
        F: FnMut() -> Result<T, rusb::Error>,
    {
        self.run_with_pause(operation, sleep)
    }

    /// As [`RetryPolicy::run`], but `pause` is called in place of sleeping between attempts.
    pub fn run_with_pause<T, F, P>(&self, mut operation: F, mut pause: P) -> Result<T, rusb::Error>
    where
        F: FnMut() -> Result<T, rusb::Error>,
        P: FnMut(Duration),
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation() {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if attempt >= attempts {
                        warn!("Transfer failed (Attempt {} of {}): {}", attempt, attempts, error);
                        return Err(error);
                    }
                    debug!(
                        "Transfer failed (Attempt {} of {}): {}, retrying",
                        attempt, attempts, error
                    );
                    pause(self.delay);
                    attempt += 1;
                }
            }
        }
    }
}
