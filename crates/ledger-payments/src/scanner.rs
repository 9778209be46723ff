//! Ledger-window balance-activity reconstruction.
//!
//! Pages through historical payments inside a bounded ledger range,
//! assigns the total-order activity sequence, and tolerates servers whose
//! retained history does not cover the requested range.

use std::collections::HashMap;

use log::warn;
use payments_core::{BalanceActivity, CancelToken, PaymentError, RetryPolicy};

use crate::classify::{build_activity, classify_payment};
use crate::config::LedgerConfig;
use crate::model::{ActivityBound, LedgerInfo, LedgerRange};
use crate::node::{LedgerNode, TxPageOptions};

/// Transactions fetched per history page.
pub const ACTIVITY_PAGE_SIZE: usize = 10;

/// Caller-supplied sink; invoked sequentially and awaited before the next
/// emission. A sink error aborts the scan.
pub type ActivitySink<'s> = dyn FnMut(BalanceActivity) -> Result<(), PaymentError> + 's;

pub struct ActivityScanner<'a, N: LedgerNode> {
    node: &'a N,
    config: &'a LedgerConfig,
    retry: RetryPolicy,
}

impl<'a, N: LedgerNode> ActivityScanner<'a, N> {
    pub fn new(node: &'a N, config: &'a LedgerConfig) -> Self {
        Self {
            node,
            config,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn read<T>(
        &self,
        cancel: &CancelToken,
        op: impl FnMut() -> Result<T, PaymentError>,
    ) -> Result<T, PaymentError> {
        self.retry
            .run(cancel, || self.node.connect().map_err(Into::into), op)
    }

    /// Resolve the caller's requested window against the server's
    /// retained ledger range, narrowing silently with a warning
    /// diagnostic when the request is wider.
    fn resolve_window(
        &self,
        from: Option<ActivityBound>,
        to: Option<ActivityBound>,
        cancel: &CancelToken,
    ) -> Result<LedgerRange, PaymentError> {
        let info = self.read(cancel, || self.node.get_server_info().map_err(Into::into))?;
        let (min_ledger, max_ledger) = parse_complete_ledgers(&info.complete_ledgers)?;
        let requested_from = from.map(|b| b.ledger()).unwrap_or(min_ledger);
        let requested_to = to.map(|b| b.ledger()).unwrap_or(max_ledger);
        let mut effective_from = requested_from;
        if effective_from < min_ledger {
            warn!(
                "requested from ledger {requested_from} predates retained history; narrowing to {min_ledger}"
            );
            effective_from = min_ledger;
        }
        let mut effective_to = requested_to;
        if effective_to > max_ledger {
            warn!(
                "requested to ledger {requested_to} exceeds retained history; narrowing to {max_ledger}"
            );
            effective_to = max_ledger;
        }
        Ok(LedgerRange {
            from: effective_from,
            to: effective_to,
        })
    }

    /// Page through the address's payment history earliest-first, feeding
    /// classified activities to `sink` in non-decreasing sequence order.
    /// Returns the window actually scanned.
    pub fn retrieve_balance_activities(
        &self,
        address: &str,
        sink: &mut ActivitySink<'_>,
        from: Option<ActivityBound>,
        to: Option<ActivityBound>,
        cancel: &CancelToken,
    ) -> Result<LedgerRange, PaymentError> {
        let window = self.resolve_window(from, to, cancel)?;
        let mut ledger_cache: HashMap<u64, LedgerInfo> = HashMap::new();
        let mut cursor: Option<String> = None;
        loop {
            cancel.checkpoint()?;
            let mut options = TxPageOptions {
                earliest_first: true,
                exclude_failures: true,
                limit: ACTIVITY_PAGE_SIZE,
                ..Default::default()
            };
            match &cursor {
                Some(id) => options.start_tx = Some(id.clone()),
                None => {
                    options.min_ledger_version = Some(window.from);
                    options.max_ledger_version = Some(window.to);
                }
            }
            let page = self.read(cancel, || {
                self.node
                    .get_transactions(address, &options)
                    .map_err(Into::into)
            })?;
            if page.is_empty() {
                break;
            }
            for payment in &page {
                cancel.checkpoint()?;
                if Some(&payment.id) == cursor.as_ref() {
                    continue; // the cursor row repeats on the next page
                }
                if payment.ledger_version < window.from || payment.ledger_version > window.to {
                    continue;
                }
                let classified = match classify_payment(&self.config.symbol, address, payment) {
                    Ok(Some(classified)) => classified,
                    Ok(None) => continue,
                    // Indeterminate activities never abort a scan.
                    Err(PaymentError::ActivityIndeterminate(reason)) => {
                        warn!("skipping unclassifiable activity: {reason}");
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                let ledger = match ledger_cache.get(&payment.ledger_version) {
                    Some(ledger) => ledger.clone(),
                    None => {
                        let fetched = self.read(cancel, || {
                            self.node
                                .get_ledger(payment.ledger_version)
                                .map_err(Into::into)
                        })?;
                        ledger_cache.insert(payment.ledger_version, fetched.clone());
                        fetched
                    }
                };
                let activity = build_activity(
                    self.config.network,
                    &self.config.symbol,
                    classified,
                    payment,
                    &ledger,
                );
                sink(activity)?;
            }
            let past_window = page
                .last()
                .map(|p| p.ledger_version > window.to)
                .unwrap_or(true);
            cursor = page.last().map(|p| p.id.clone());
            if page.len() < ACTIVITY_PAGE_SIZE || past_window {
                break;
            }
        }
        Ok(window)
    }
}

fn parse_complete_ledgers(raw: &str) -> Result<(u64, u64), PaymentError> {
    let parsed = raw.trim().split_once('-').and_then(|(min, max)| {
        let min = min.parse::<u64>().ok()?;
        let max = max.parse::<u64>().ok()?;
        (min <= max).then_some((min, max))
    });
    parsed.ok_or_else(|| {
        PaymentError::Server(format!(
            "server reports unusable ledger history {raw:?}"
        ))
    })
}
