use std::thread;
use std::time::Duration;

use log::warn;

use crate::cancel::CancelToken;
use crate::error::PaymentError;

/// Reconnect-and-retry policy for idempotent reads against a flaky
/// transport. Only `TransportDisconnected` is retried; every other error
/// propagates immediately.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            factor: 2,
        }
    }
}

impl RetryPolicy {
    /// Run `op`, reconnecting and retrying on transport disconnects with
    /// exponential backoff. `reconnect` failures are logged; the next
    /// attempt surfaces the persisting disconnect.
    pub fn run<T>(
        &self,
        cancel: &CancelToken,
        mut reconnect: impl FnMut() -> Result<(), PaymentError>,
        mut op: impl FnMut() -> Result<T, PaymentError>,
    ) -> Result<T, PaymentError> {
        let mut delay = self.initial_delay;
        let mut attempt = 0u32;
        loop {
            cancel.checkpoint()?;
            match op() {
                Ok(value) => return Ok(value),
                Err(PaymentError::TransportDisconnected(msg)) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(PaymentError::TransportDisconnected(msg));
                    }
                    warn!(
                        "transport disconnected ({msg}); retrying in {delay:?} (attempt {attempt}/{})",
                        self.max_attempts
                    );
                    thread::sleep(delay);
                    cancel.checkpoint()?;
                    if let Err(err) = reconnect() {
                        warn!("reconnect attempt failed: {err}");
                    }
                    delay = (delay * self.factor).min(self.max_delay);
                }
                Err(other) => return Err(other),
            }
        }
    }
}
