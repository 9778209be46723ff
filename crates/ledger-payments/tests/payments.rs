//! Contract-level coverage for the account-ledger payments implementation.

use std::collections::HashMap;

use ledger_payments::{
    AssetAmount, LedgerConfig, LedgerInfo, LedgerNode, LedgerPayment, PaymentEndpoint, ServerInfo,
    SignedLedgerTransaction, TxPageOptions,
};
use payments_core::{
    AddressScheme, CancelToken, CreateOptions, FeeRate, FeeRateType, FixedFeeOracle, NetworkType,
    NodeError, PaymentError, Payments, Payport,
};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

struct RippleScheme;

impl AddressScheme for RippleScheme {
    fn validate_address(&self, address: &str) -> bool {
        address.starts_with('r') && address.len() > 3
    }

    fn derive_address(&self, index: u64) -> Result<String, PaymentError> {
        Ok(format!("rDerived{index}"))
    }
}

struct MockNode {
    /// account address -> (balance drops, sequence)
    accounts: HashMap<String, (&'static str, u64)>,
    submit_engine_result: &'static str,
}

impl MockNode {
    fn new() -> Self {
        let mut accounts = HashMap::new();
        accounts.insert("rFunded01".to_string(), ("25000000", 7));
        Self {
            accounts,
            submit_engine_result: "tesSUCCESS",
        }
    }
}

impl LedgerNode for MockNode {
    fn is_connected(&self) -> bool {
        true
    }

    fn connect(&self) -> Result<(), NodeError> {
        Ok(())
    }

    fn disconnect(&self) -> Result<(), NodeError> {
        Ok(())
    }

    fn request(&self, method: &str, params: Value) -> Result<Value, NodeError> {
        match method {
            "account_info" => {
                let account = params
                    .get("account")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                match self.accounts.get(account) {
                    Some((balance, sequence)) => Ok(json!({
                        "account_data": { "Balance": balance, "Sequence": sequence }
                    })),
                    None => Err(NodeError::Server("actNotFound: account unknown".into())),
                }
            }
            "submit" => Ok(json!({
                "engine_result": self.submit_engine_result,
                "tx_json": { "hash": "A1B2C3D4" }
            })),
            other => Err(NodeError::Server(format!("unexpected request {other}"))),
        }
    }

    fn get_server_info(&self) -> Result<ServerInfo, NodeError> {
        Ok(ServerInfo {
            complete_ledgers: "1000-2000".into(),
        })
    }

    fn get_transactions(
        &self,
        _address: &str,
        _options: &TxPageOptions,
    ) -> Result<Vec<LedgerPayment>, NodeError> {
        Ok(Vec::new())
    }

    fn get_transaction(&self, id: &str) -> Result<LedgerPayment, NodeError> {
        let mut balance_changes = HashMap::new();
        balance_changes.insert(
            "rDest9999".to_string(),
            vec![AssetAmount {
                currency: "XRP".into(),
                value: dec!(3),
            }],
        );
        Ok(LedgerPayment {
            id: id.into(),
            ledger_version: 1_500,
            index_in_ledger: 4,
            source: PaymentEndpoint {
                address: "rFunded01".into(),
                tag: None,
            },
            destination: PaymentEndpoint {
                address: "rDest9999".into(),
                tag: None,
            },
            successful: true,
            fee: dec!(0.000012),
            balance_changes,
        })
    }

    fn get_ledger(&self, ledger_version: u64) -> Result<LedgerInfo, NodeError> {
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

fn payments(
    node: MockNode,
) -> ledger_payments::LedgerPayments<MockNode, RippleScheme, FixedFeeOracle> {
    let config = LedgerConfig::new(NetworkType::Mainnet, "XRP", 6).with_min_balance(dec!(20));
    let oracle = FixedFeeOracle {
        rate: FeeRate::new(dec!(0.000012), FeeRateType::Main),
    };
    ledger_payments::LedgerPayments::new(config, node, RippleScheme, oracle).unwrap()
}

#[test]
fn funded_account_reports_reserve_adjusted_balance() {
    let payments = payments(MockNode::new());
    let balance = payments
        .get_balance(&Payport::address("rFunded01"), &CancelToken::new())
        .unwrap();
    assert_eq!(balance.confirmed, dec!(25));
    assert_eq!(balance.spendable, dec!(5));
    assert!(balance.sweepable);
    assert!(!balance.requires_activation);
}

#[test]
fn unknown_account_requires_activation() {
    let payments = payments(MockNode::new());
    let balance = payments
        .get_balance(&Payport::address("rNewAccount"), &CancelToken::new())
        .unwrap();
    assert!(balance.requires_activation);
    assert_eq!(balance.confirmed, dec!(0));
    assert!(!balance.sweepable);
}

#[test]
fn create_transaction_carries_sequence_and_extra_id() {
    let payments = payments(MockNode::new());
    let plan = payments
        .create_transaction(
            &Payport::address("rFunded01"),
            &Payport::detailed("rDest9999", Some("777".into())),
            dec!(3),
            &CreateOptions::default(),
            &CancelToken::new(),
        )
        .unwrap();
    assert_eq!(plan.from_address, "rFunded01");
    assert_eq!(plan.to_address, "rDest9999");
    assert_eq!(plan.to_extra_id.as_deref(), Some("777"));
    assert_eq!(plan.amount, dec!(3));
    assert_eq!(plan.fee, dec!(0.000012));
    assert_eq!(plan.sequence, 7);
    assert_eq!(plan.asset_symbol, "XRP");
}

#[test]
fn reserve_counts_against_spendable_funds() {
    let payments = payments(MockNode::new());
    // 6 + fee + 20 reserve exceeds the 25 balance.
    let result = payments.create_transaction(
        &Payport::address("rFunded01"),
        &Payport::address("rDest9999"),
        dec!(6),
        &CreateOptions::default(),
        &CancelToken::new(),
    );
    match result {
        Err(PaymentError::InsufficientFunds {
            required,
            available,
        }) => {
            assert_eq!(required, 26_000_012);
            assert_eq!(available, 25_000_000);
        }
        other => panic!("expected insufficient funds, got {other:?}"),
    }
}

#[test]
fn sweep_leaves_reserve_and_fee_behind() {
    let payments = payments(MockNode::new());
    let plan = payments
        .create_sweep_transaction(
            &Payport::address("rFunded01"),
            &Payport::address("rDest9999"),
            &CreateOptions::default(),
            &CancelToken::new(),
        )
        .unwrap();
    assert_eq!(plan.amount, dec!(4.999988));
    assert_eq!(plan.fee, dec!(0.000012));
}

#[test]
fn sub_base_unit_amounts_are_rejected() {
    let payments = payments(MockNode::new());
    let result = payments.create_transaction(
        &Payport::address("rFunded01"),
        &Payport::address("rDest9999"),
        dec!(0.0000001),
        &CreateOptions::default(),
        &CancelToken::new(),
    );
    assert!(matches!(result, Err(PaymentError::InvalidAmount(_))));
}

#[test]
fn multi_output_requires_exactly_one_destination() {
    let payments = payments(MockNode::new());
    let outputs = vec![
        (Payport::address("rDest9999"), dec!(1)),
        (Payport::address("rDest8888"), dec!(1)),
    ];
    let result = payments.create_multi_output_transaction(
        &Payport::address("rFunded01"),
        &outputs,
        &CreateOptions::default(),
        &CancelToken::new(),
    );
    assert!(matches!(result, Err(PaymentError::InvalidAmount(_))));

    let single = vec![(Payport::address("rDest9999"), dec!(1))];
    assert!(payments
        .create_multi_output_transaction(
            &Payport::address("rFunded01"),
            &single,
            &CreateOptions::default(),
            &CancelToken::new(),
        )
        .is_ok());
}

#[test]
fn submit_success_uses_server_hash() {
    let payments = payments(MockNode::new());
    let signed = SignedLedgerTransaction {
        id: "LOCALHASH".into(),
        tx_blob: "deadbeef".into(),
    };
    let result = payments
        .broadcast_transaction(&signed, &CancelToken::new())
        .unwrap();
    assert_eq!(result.id, "A1B2C3D4");
}

#[test]
fn duplicate_submit_is_reported_as_success() {
    let mut node = MockNode::new();
    node.submit_engine_result = "tefALREADY";
    let payments = payments(node);
    let signed = SignedLedgerTransaction {
        id: "LOCALHASH".into(),
        tx_blob: "deadbeef".into(),
    };
    let result = payments
        .broadcast_transaction(&signed, &CancelToken::new())
        .unwrap();
    assert_eq!(result.id, "LOCALHASH");
}

#[test]
fn failed_submit_surfaces_engine_result() {
    let mut node = MockNode::new();
    node.submit_engine_result = "temBAD_FEE";
    let payments = payments(node);
    let signed = SignedLedgerTransaction {
        id: "LOCALHASH".into(),
        tx_blob: "deadbeef".into(),
    };
    let result = payments.broadcast_transaction(&signed, &CancelToken::new());
    assert!(matches!(result, Err(PaymentError::Server(msg)) if msg.contains("temBAD_FEE")));
}

#[test]
fn transaction_info_combines_payment_ledger_and_tip() {
    let payments = payments(MockNode::new());
    let info = payments
        .get_transaction_info("tx77", &CancelToken::new())
        .unwrap();
    assert_eq!(info.id, "tx77");
    assert_eq!(info.amount, dec!(3));
    assert_eq!(info.fee, dec!(0.000012));
    assert!(info.is_confirmed);
    assert_eq!(info.confirmations, 501);
    assert_eq!(info.block_id.as_deref(), Some("hash1500"));
    assert_eq!(info.block_height, Some(1_500));
    assert_eq!(info.timestamp, Some(15_000));
}

#[test]
fn family_predicates() {
    let payments = payments(MockNode::new());
    assert!(!payments.uses_utxos());
    assert!(payments.uses_sequence_number());
    assert!(payments.requires_balance_monitor());
}
