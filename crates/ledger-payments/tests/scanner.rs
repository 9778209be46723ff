//! History-scan coverage: window narrowing, pagination, ordering,
//! de-duplication, retry and sink semantics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ledger_payments::{
    ActivityBound, ActivityScanner, AssetAmount, LedgerConfig, LedgerInfo, LedgerNode,
    LedgerPayment, PaymentEndpoint, ServerInfo, TxPageOptions,
};
use payments_core::{CancelToken, NetworkType, NodeError, PaymentError, RetryPolicy};
use rust_decimal_macros::dec;
use serde_json::Value;

const ME: &str = "rMyAddress";
const PEER: &str = "rPeerAddress";

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
        factor: 2,
    }
}

fn config() -> LedgerConfig {
    LedgerConfig::new(NetworkType::Mainnet, "XRP", 6)
}

fn payment(id: &str, ledger_version: u64, index_in_ledger: u64, outbound: bool) -> LedgerPayment {
    let (source, destination) = if outbound { (ME, PEER) } else { (PEER, ME) };
    let mut balance_changes = HashMap::new();
    balance_changes.insert(
        source.to_string(),
        vec![AssetAmount {
            currency: "XRP".into(),
            value: dec!(-10),
        }],
    );
    balance_changes.insert(
        destination.to_string(),
        vec![AssetAmount {
            currency: "XRP".into(),
            value: dec!(10),
        }],
    );
    LedgerPayment {
        id: id.into(),
        ledger_version,
        index_in_ledger,
        source: PaymentEndpoint {
            address: source.into(),
            tag: None,
        },
        destination: PaymentEndpoint {
            address: destination.into(),
            tag: None,
        },
        successful: true,
        fee: dec!(0.000012),
        balance_changes,
    }
}

struct MockNode {
    complete_ledgers: String,
    payments: Vec<LedgerPayment>,
    server_info_failures: AtomicUsize,
    connect_calls: AtomicUsize,
    ledger_calls: AtomicUsize,
}

impl MockNode {
    fn new(complete_ledgers: &str, payments: Vec<LedgerPayment>) -> Self {
        Self {
            complete_ledgers: complete_ledgers.into(),
            payments,
            server_info_failures: AtomicUsize::new(0),
            connect_calls: AtomicUsize::new(0),
            ledger_calls: AtomicUsize::new(0),
        }
    }

    fn failing_first_server_info(self, failures: usize) -> Self {
        self.server_info_failures.store(failures, Ordering::SeqCst);
        self
    }
}

impl LedgerNode for MockNode {
    fn is_connected(&self) -> bool {
        true
    }

    fn connect(&self) -> Result<(), NodeError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) -> Result<(), NodeError> {
        Ok(())
    }

    fn request(&self, method: &str, _params: Value) -> Result<Value, NodeError> {
        Err(NodeError::Server(format!("unexpected request {method}")))
    }

    fn get_server_info(&self) -> Result<ServerInfo, NodeError> {
        let remaining = self.server_info_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.server_info_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(NodeError::Disconnected("websocket dropped".into()));
        }
        Ok(ServerInfo {
            complete_ledgers: self.complete_ledgers.clone(),
        })
    }

    fn get_transactions(
        &self,
        _address: &str,
        options: &TxPageOptions,
    ) -> Result<Vec<LedgerPayment>, NodeError> {
        let page: Vec<LedgerPayment> = match &options.start_tx {
            // Servers return the cursor row as the first result.
            Some(cursor) => {
                let start = self
                    .payments
                    .iter()
                    .position(|p| &p.id == cursor)
                    .unwrap_or(self.payments.len());
                self.payments
                    .iter()
                    .skip(start)
                    .take(options.limit)
                    .cloned()
                    .collect()
            }
            None => self
                .payments
                .iter()
                .filter(|p| {
                    options
                        .min_ledger_version
                        .map_or(true, |min| p.ledger_version >= min)
                        && options
                            .max_ledger_version
                            .map_or(true, |max| p.ledger_version <= max)
                })
                .take(options.limit)
                .cloned()
                .collect(),
        };
        let page = if options.exclude_failures {
            page.into_iter().filter(|p| p.successful).collect()
        } else {
            page
        };
        Ok(page)
    }

    fn get_transaction(&self, id: &str) -> Result<LedgerPayment, NodeError> {
        self.payments
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| NodeError::Server(format!("txnNotFound: {id}")))
    }

    fn get_ledger(&self, ledger_version: u64) -> Result<LedgerInfo, NodeError> {
        self.ledger_calls.fetch_add(1, Ordering::SeqCst);
        Ok(LedgerInfo {
            ledger_hash: format!("hash{ledger_version}"),
            close_time: ledger_version * 10,
        })
    }

    fn subscribe(&self, _addresses: &[String]) -> Result<(), NodeError> {
        Ok(())
    }

    fn next_event(&self) -> Result<Option<LedgerPayment>, NodeError> {
        Ok(None)
    }
}

fn collect(
    node: &MockNode,
    config: &LedgerConfig,
    from: Option<ActivityBound>,
    to: Option<ActivityBound>,
) -> (Vec<payments_core::BalanceActivity>, ledger_payments::LedgerRange) {
    let scanner = ActivityScanner::new(node, config).with_retry_policy(fast_retry());
    let mut activities = Vec::new();
    let mut sink = |activity: payments_core::BalanceActivity| -> Result<(), PaymentError> {
        activities.push(activity);
        Ok(())
    };
    let range = scanner
        .retrieve_balance_activities(ME, &mut sink, from, to, &CancelToken::new())
        .unwrap();
    (activities, range)
}

#[test]
fn wider_request_is_narrowed_to_server_history() {
    let node = MockNode::new("1000-2000", vec![payment("t1", 1_200, 1, false)]);
    let (activities, range) = collect(
        &node,
        &config(),
        Some(ActivityBound::Height(500)),
        Some(ActivityBound::Height(2_500)),
    );
    assert_eq!(range.from, 1_000);
    assert_eq!(range.to, 2_000);
    assert_eq!(activities.len(), 1);
}

#[test]
fn omitted_bounds_default_to_server_history() {
    let node = MockNode::new("1000-2000", vec![payment("t1", 1_200, 1, true)]);
    let (_, range) = collect(&node, &config(), None, None);
    assert_eq!(range.from, 1_000);
    assert_eq!(range.to, 2_000);
}

#[test]
fn pages_are_cursor_chained_with_dedup_and_ordering() {
    // Twelve payments inside the window (the first two share ledger 1000)
    // plus one beyond the retained range.
    let mut payments = Vec::new();
    for i in 0u64..12 {
        let ledger = if i <= 1 { 1_000 } else { 1_000 + i * 50 };
        let index = if i <= 1 { i + 1 } else { 1 };
        payments.push(payment(&format!("t{i}"), ledger, index, i % 2 == 0));
    }
    payments.push(payment("beyond", 2_600, 1, false));
    let node = MockNode::new("1000-2000", payments);

    let (activities, range) = collect(&node, &config(), None, None);
    assert_eq!(range.from, 1_000);
    assert_eq!(range.to, 2_000);
    assert_eq!(activities.len(), 12, "cursor row deduped, out-of-window dropped");

    // Strictly increasing activity sequences (P5).
    for pair in activities.windows(2) {
        assert!(
            pair[0].activity_sequence < pair[1].activity_sequence,
            "{} !< {}",
            pair[0].activity_sequence,
            pair[1].activity_sequence
        );
    }
    // Ledger metadata is fetched once per distinct ledger.
    assert_eq!(node.ledger_calls.load(Ordering::SeqCst), 11);
    // Direction carries into signed amounts.
    assert_eq!(activities[0].amount, dec!(-10));
    assert_eq!(activities[1].amount, dec!(10));
}

#[test]
fn unclassifiable_payments_are_skipped_not_fatal() {
    // The middle payment credits ME with a token only; its native amount
    // is indeterminate and the scan must step over it.
    let mut token_only = payment("t2", 1_300, 1, false);
    token_only.balance_changes.get_mut(ME).unwrap()[0].currency = "USD".into();
    let payments = vec![
        payment("t1", 1_200, 1, true),
        token_only,
        payment("t3", 1_400, 1, false),
    ];
    let node = MockNode::new("1000-2000", payments);
    let (activities, _) = collect(&node, &config(), None, None);
    let ids: Vec<&str> = activities.iter().map(|a| a.external_id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t3"]);
}

#[test]
fn scan_is_repeatable() {
    let mut payments = Vec::new();
    for i in 0u64..5 {
        payments.push(payment(&format!("t{i}"), 1_100 + i * 10, 1, i % 2 == 0));
    }
    let node = MockNode::new("1000-2000", payments);
    let (first, _) = collect(&node, &config(), None, None);
    let (second, _) = collect(&node, &config(), None, None);
    assert_eq!(first, second);
}

#[test]
fn transient_disconnect_is_retried() {
    let node =
        MockNode::new("1000-2000", vec![payment("t1", 1_500, 1, false)]).failing_first_server_info(1);
    let (activities, _) = collect(&node, &config(), None, None);
    assert_eq!(activities.len(), 1);
    assert!(node.connect_calls.load(Ordering::SeqCst) >= 1);
}

#[test]
fn persistent_disconnect_surfaces() {
    let node =
        MockNode::new("1000-2000", vec![payment("t1", 1_500, 1, false)]).failing_first_server_info(10);
    let cfg = config();
    let scanner = ActivityScanner::new(&node, &cfg).with_retry_policy(fast_retry());
    let mut sink = |_activity: payments_core::BalanceActivity| -> Result<(), PaymentError> { Ok(()) };
    let result =
        scanner.retrieve_balance_activities(ME, &mut sink, None, None, &CancelToken::new());
    assert!(matches!(result, Err(PaymentError::TransportDisconnected(_))));
}

#[test]
fn sink_error_aborts_the_scan() {
    let payments = vec![
        payment("t1", 1_100, 1, true),
        payment("t2", 1_200, 1, false),
        payment("t3", 1_300, 1, true),
    ];
    let node = MockNode::new("1000-2000", payments);
    let cfg = config();
    let scanner = ActivityScanner::new(&node, &cfg).with_retry_policy(fast_retry());
    let calls = AtomicUsize::new(0);
    let mut sink = |_activity: payments_core::BalanceActivity| -> Result<(), PaymentError> {
        let seen = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if seen == 2 {
            Err(PaymentError::Server("sink full".into()))
        } else {
            Ok(())
        }
    };
    let result =
        scanner.retrieve_balance_activities(ME, &mut sink, None, None, &CancelToken::new());
    assert!(matches!(result, Err(PaymentError::Server(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn unusable_history_is_a_server_error() {
    let node = MockNode::new("empty", vec![]);
    let cfg = config();
    let scanner = ActivityScanner::new(&node, &cfg).with_retry_policy(fast_retry());
    let mut sink = |_activity: payments_core::BalanceActivity| -> Result<(), PaymentError> { Ok(()) };
    let result =
        scanner.retrieve_balance_activities(ME, &mut sink, None, None, &CancelToken::new());
    assert!(matches!(result, Err(PaymentError::Server(_))));
}

#[test]
fn cancellation_stops_the_scan_before_any_emission() {
    let node = MockNode::new("1000-2000", vec![payment("t1", 1_500, 1, false)]);
    let cfg = config();
    let scanner = ActivityScanner::new(&node, &cfg).with_retry_policy(fast_retry());
    let calls = AtomicUsize::new(0);
    let mut sink = |_activity: payments_core::BalanceActivity| -> Result<(), PaymentError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    };
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = scanner.retrieve_balance_activities(ME, &mut sink, None, None, &cancel);
    assert!(matches!(result, Err(PaymentError::Cancelled)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn activity_bounds_accept_prior_activities() {
    let node = MockNode::new("1000-2000", vec![payment("t1", 1_500, 1, false)]);
    let (activities, _) = collect(&node, &config(), None, None);
    let bound = ActivityBound::from(&activities[0]);
    assert_eq!(bound.ledger(), 1_500);
    let (again, range) = collect(&node, &config(), Some(bound), None);
    assert_eq!(range.from, 1_500);
    assert_eq!(again.len(), 1);
}
