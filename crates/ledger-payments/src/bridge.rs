// SPDX-License-Identifier: Apache-2.0

//! Subscription bridge mapping server-pushed payment events into the
//! uniform activity model.

use std::collections::{BTreeSet, VecDeque};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use parking_lot::RwLock;
use payments_core::{
    AddressScheme, BalanceActivity, CancelToken, PaymentError, RetryPolicy,
};

use crate::classify::{build_activity, classify_payment};
use crate::config::LedgerConfig;
use crate::node::LedgerNode;
use crate::scanner::ActivitySink;

/// Best-effort balance monitor over the server's push stream. Events are
/// classified with the same rules as the history scanner; disconnects are
/// absorbed by the retry policy.
pub struct BalanceMonitor<'a, N: LedgerNode> {
    node: &'a N,
    config: &'a LedgerConfig,
    scheme: &'a dyn AddressScheme,
    retry: RetryPolicy,
    tracked: RwLock<BTreeSet<String>>,
    poll_interval: Duration,
}

impl<'a, N: LedgerNode> BalanceMonitor<'a, N> {
    pub fn new(node: &'a N, config: &'a LedgerConfig, scheme: &'a dyn AddressScheme) -> Self {
        Self {
            node,
            config,
            scheme,
            retry: RetryPolicy::default(),
            tracked: RwLock::new(BTreeSet::new()),
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Register push notifications for `addresses`. Every address must
    /// validate; server-side rejection is logged and the subscription
    /// stays best-effort.
    pub fn subscribe(&self, addresses: &[String]) -> Result<(), PaymentError> {
        for address in addresses {
            if !self.scheme.validate_address(address) {
                return Err(PaymentError::InvalidAddress(address.clone()));
            }
        }
        self.tracked.write().extend(addresses.iter().cloned());
        if let Err(err) = self.node.subscribe(addresses) {
            warn!("server rejected subscription: {err}; relying on history scans to catch up");
        }
        Ok(())
    }

    /// Drain at most one pending event, emitting an activity for every
    /// tracked address the payment concerns. Returns the emission count.
    pub fn poll_once(
        &self,
        sink: &mut ActivitySink<'_>,
        cancel: &CancelToken,
    ) -> Result<usize, PaymentError> {
        cancel.checkpoint()?;
        let event = self.retry.run(
            cancel,
            || self.node.connect().map_err(Into::into),
            || self.node.next_event().map_err(Into::into),
        )?;
        let payment = match event {
            Some(payment) => payment,
            None => return Ok(0),
        };
        if !payment.successful {
            debug!("ignoring failed payment event {}", payment.id);
            return Ok(0);
        }
        let tracked: Vec<String> = self.tracked.read().iter().cloned().collect();
        let mut emitted = 0;
        for address in tracked {
            let classified = match classify_payment(&self.config.symbol, &address, &payment) {
                Ok(Some(classified)) => classified,
                Ok(None) => continue,
                Err(PaymentError::ActivityIndeterminate(reason)) => {
                    warn!("skipping unclassifiable activity: {reason}");
                    continue;
                }
                Err(err) => return Err(err),
            };
            let ledger = self.retry.run(
                cancel,
                || self.node.connect().map_err(Into::into),
                || {
                    self.node
                        .get_ledger(payment.ledger_version)
                        .map_err(Into::into)
                },
            )?;
            let activity = build_activity(
                self.config.network,
                &self.config.symbol,
                classified,
                &payment,
                &ledger,
            );
            sink(activity)?;
            emitted += 1;
        }
        Ok(emitted)
    }

    /// Block draining events into `sink` until cancelled. Cancellation is
    /// a normal shutdown, not an error.
    pub fn watch(
        &self,
        sink: &mut ActivitySink<'_>,
        cancel: &CancelToken,
    ) -> Result<(), PaymentError> {
        loop {
            match self.poll_once(sink, cancel) {
                Ok(0) => {
                    if cancel.is_cancelled() {
                        return Ok(());
                    }
                    thread::sleep(self.poll_interval);
                }
                Ok(_) => {}
                Err(PaymentError::Cancelled) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
    }

    /// Lazy, cancellable sequence over the push stream; the caller drains
    /// it at its own pace.
    pub fn stream(&self, cancel: CancelToken) -> ActivityStream<'_, 'a, N> {
        ActivityStream {
            monitor: self,
            cancel,
            pending: VecDeque::new(),
        }
    }
}

/// Iterator face of [`BalanceMonitor`]; ends when its token is cancelled.
pub struct ActivityStream<'m, 'a, N: LedgerNode> {
    monitor: &'m BalanceMonitor<'a, N>,
    cancel: CancelToken,
    pending: VecDeque<BalanceActivity>,
}

impl<N: LedgerNode> Iterator for ActivityStream<'_, '_, N> {
    type Item = Result<BalanceActivity, PaymentError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(activity) = self.pending.pop_front() {
                return Some(Ok(activity));
            }
            if self.cancel.is_cancelled() {
                return None;
            }
            let mut buffer: Vec<BalanceActivity> = Vec::new();
            let polled = {
                let mut sink = |activity: BalanceActivity| -> Result<(), PaymentError> {
                    buffer.push(activity);
                    Ok(())
                };
                self.monitor.poll_once(&mut sink, &self.cancel)
            };
            match polled {
                Ok(0) => thread::sleep(self.monitor.poll_interval()),
                Ok(_) => self.pending.extend(buffer),
                Err(PaymentError::Cancelled) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
