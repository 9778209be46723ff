use log::warn;
use payments_core::{
    resolve_fee_option, resolve_payport, AddressScheme, Balance, BroadcastResult, CancelToken,
    CreateOptions, FeeLevel, FeeOption, FeeOracle, FeeRateType, PaymentError, Payments, Payport,
    RetryPolicy, TransactionInfo,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::bridge::BalanceMonitor;
use crate::config::LedgerConfig;
use crate::model::{LedgerPaymentPlan, SignedLedgerTransaction};
use crate::node::LedgerNode;
use crate::scanner::ActivityScanner;

/// Engine results accepted as a successful submission.
const SUBMIT_OK: [&str; 2] = ["tesSUCCESS", "terQUEUED"];
/// Engine result for a transaction the server already holds; the
/// account-side analog of a mempool duplicate.
const SUBMIT_DUPLICATE: &str = "tefALREADY";

#[derive(Clone, Debug)]
struct AccountInfo {
    balance: Decimal,
    sequence: u64,
}

/// Account-ledger implementation of the payment contract.
pub struct LedgerPayments<N: LedgerNode, S: AddressScheme, O: FeeOracle> {
    config: LedgerConfig,
    node: N,
    scheme: S,
    fee_oracle: O,
    retry: RetryPolicy,
}

impl<N: LedgerNode, S: AddressScheme, O: FeeOracle> LedgerPayments<N, S, O> {
    pub fn new(
        config: LedgerConfig,
        node: N,
        scheme: S,
        fee_oracle: O,
    ) -> Result<Self, PaymentError> {
        config.validate()?;
        Ok(Self {
            config,
            node,
            scheme,
            fee_oracle,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    /// History scanner over this instance's node and configuration.
    pub fn activity_scanner(&self) -> ActivityScanner<'_, N> {
        ActivityScanner::new(&self.node, &self.config).with_retry_policy(self.retry)
    }

    /// Push-subscription monitor over this instance's node and
    /// configuration.
    pub fn balance_monitor(&self) -> BalanceMonitor<'_, N> {
        BalanceMonitor::new(&self.node, &self.config, &self.scheme)
            .with_retry_policy(self.retry)
    }

    fn ensure_connected(&self, cancel: &CancelToken) -> Result<(), PaymentError> {
        if self.node.is_connected() {
            return Ok(());
        }
        self.retry
            .run(cancel, || Ok(()), || self.node.connect().map_err(Into::into))
    }

    fn read<T>(
        &self,
        cancel: &CancelToken,
        op: impl FnMut() -> Result<T, PaymentError>,
    ) -> Result<T, PaymentError> {
        self.retry
            .run(cancel, || self.node.connect().map_err(Into::into), op)
    }

    fn account_info(
        &self,
        address: &str,
        cancel: &CancelToken,
    ) -> Result<Option<AccountInfo>, PaymentError> {
        self.ensure_connected(cancel)?;
        let params = json!({ "account": address, "ledger_index": "validated" });
        let response = match self.read(cancel, || {
            self.node
                .request("account_info", params.clone())
                .map_err(Into::into)
        }) {
            Ok(response) => response,
            Err(PaymentError::Server(msg)) if msg.contains("actNotFound") => return Ok(None),
            Err(err) => return Err(err),
        };
        if response.get("error").and_then(Value::as_str) == Some("actNotFound") {
            return Ok(None);
        }
        let data = response.get("account_data").ok_or_else(|| {
            PaymentError::Server("account_info response missing account_data".into())
        })?;
        let balance_raw = data.get("Balance").and_then(Value::as_str).ok_or_else(|| {
            PaymentError::Server("account_info response missing Balance".into())
        })?;
        let sequence = data.get("Sequence").and_then(Value::as_u64).ok_or_else(|| {
            PaymentError::Server("account_info response missing Sequence".into())
        })?;
        let denom = self.config.denomination();
        let balance_base = denom.parse_base_str(balance_raw)?;
        Ok(Some(AccountInfo {
            balance: denom.base_to_main(balance_base),
            sequence,
        }))
    }

    fn resolve_fee(&self, options: &CreateOptions) -> Result<Decimal, PaymentError> {
        let option = options
            .fee
            .clone()
            .unwrap_or(FeeOption::Level(FeeLevel::Normal));
        let resolved = resolve_fee_option(&self.fee_oracle, &option)?;
        match resolved.target_fee_rate_type {
            FeeRateType::Main => Ok(resolved.target_fee_rate),
            FeeRateType::Base => Ok(self
                .config
                .denomination()
                .base_decimal_to_main(resolved.target_fee_rate)),
            FeeRateType::BasePerWeight => Err(PaymentError::InvalidAmount(
                "per-weight fee rates do not apply to account ledgers".into(),
            )),
        }
    }

    fn build_plan(
        &self,
        from: &Payport,
        to: &Payport,
        amount: Option<Decimal>,
        options: &CreateOptions,
        cancel: &CancelToken,
    ) -> Result<LedgerPaymentPlan, PaymentError> {
        let from_resolved = resolve_payport(&self.scheme, from)?;
        let to_resolved = resolve_payport(&self.scheme, to)?;
        let fee = self.resolve_fee(options)?;
        let info = self
            .account_info(&from_resolved.address, cancel)?
            .ok_or_else(|| {
                PaymentError::InvalidAddress(format!(
                    "source account {} is not activated",
                    from_resolved.address
                ))
            })?;
        let denom = self.config.denomination();
        let amount = match amount {
            Some(amount) => {
                if amount <= Decimal::ZERO {
                    return Err(PaymentError::InvalidAmount(format!(
                        "payment amount must be positive, got {amount}"
                    )));
                }
                denom.main_to_base(amount)?; // precision contract check
                amount
            }
            // Sweep: everything above fee and reserve.
            None => info.balance - fee - self.config.min_balance,
        };
        let required = amount + fee + self.config.min_balance;
        if amount <= Decimal::ZERO || required > info.balance {
            return Err(PaymentError::InsufficientFunds {
                required: denom.main_to_base_floor(required.max(Decimal::ZERO))?,
                available: denom.main_to_base_floor(info.balance)?,
            });
        }
        cancel.checkpoint()?;
        Ok(LedgerPaymentPlan {
            from_address: from_resolved.address,
            to_address: to_resolved.address,
            to_extra_id: to_resolved.extra_id,
            amount,
            fee,
            sequence: info.sequence,
            network: self.config.network,
            asset_symbol: self.config.symbol.clone(),
        })
    }
}

impl<N: LedgerNode, S: AddressScheme, O: FeeOracle> Payments for LedgerPayments<N, S, O> {
    type Plan = LedgerPaymentPlan;
    type Signed = SignedLedgerTransaction;

    fn get_balance(&self, payport: &Payport, cancel: &CancelToken) -> Result<Balance, PaymentError> {
        let resolved = resolve_payport(&self.scheme, payport)?;
        match self.account_info(&resolved.address, cancel)? {
            None => Ok(Balance::inactive()),
            Some(info) => {
                let spendable = (info.balance - self.config.min_balance).max(Decimal::ZERO);
                Ok(Balance {
                    confirmed: info.balance,
                    unconfirmed: Decimal::ZERO,
                    spendable,
                    sweepable: spendable > Decimal::ZERO,
                    requires_activation: false,
                })
            }
        }
    }

    fn create_transaction(
        &self,
        from: &Payport,
        to: &Payport,
        amount: Decimal,
        options: &CreateOptions,
        cancel: &CancelToken,
    ) -> Result<LedgerPaymentPlan, PaymentError> {
        self.build_plan(from, to, Some(amount), options, cancel)
    }

    fn create_multi_output_transaction(
        &self,
        from: &Payport,
        outputs: &[(Payport, Decimal)],
        options: &CreateOptions,
        cancel: &CancelToken,
    ) -> Result<LedgerPaymentPlan, PaymentError> {
        match outputs {
            [(to, amount)] => self.build_plan(from, to, Some(*amount), options, cancel),
            _ => Err(PaymentError::InvalidAmount(
                "account-ledger payments carry exactly one destination".into(),
            )),
        }
    }

    fn create_sweep_transaction(
        &self,
        from: &Payport,
        to: &Payport,
        options: &CreateOptions,
        cancel: &CancelToken,
    ) -> Result<LedgerPaymentPlan, PaymentError> {
        self.build_plan(from, to, None, options, cancel)
    }

    fn broadcast_transaction(
        &self,
        signed: &SignedLedgerTransaction,
        cancel: &CancelToken,
    ) -> Result<BroadcastResult, PaymentError> {
        self.ensure_connected(cancel)?;
        let params = json!({ "tx_blob": signed.tx_blob });
        let response = self.read(cancel, || {
            self.node.request("submit", params.clone()).map_err(Into::into)
        })?;
        let engine_result = response
            .get("engine_result")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if SUBMIT_OK.contains(&engine_result.as_str()) {
            let id = response
                .get("tx_json")
                .and_then(|tx| tx.get("hash"))
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| signed.id.clone());
            return Ok(BroadcastResult { id });
        }
        if engine_result == SUBMIT_DUPLICATE {
            warn!(
                "transaction {} already known to the server; reporting submission as success",
                signed.id
            );
            return Ok(BroadcastResult {
                id: signed.id.clone(),
            });
        }
        Err(PaymentError::Server(format!(
            "submit failed with engine result {engine_result:?}"
        )))
    }

    fn get_transaction_info(
        &self,
        txid: &str,
        cancel: &CancelToken,
    ) -> Result<TransactionInfo, PaymentError> {
        self.ensure_connected(cancel)?;
        let payment = self.read(cancel, || self.node.get_transaction(txid).map_err(Into::into))?;
        let ledger = self.read(cancel, || {
            self.node
                .get_ledger(payment.ledger_version)
                .map_err(Into::into)
        })?;
        let info = self.read(cancel, || self.node.get_server_info().map_err(Into::into))?;
        let confirmations = info
            .complete_ledgers
            .rsplit_once('-')
            .and_then(|(_, max)| max.trim().parse::<u64>().ok())
            .map(|max| max.saturating_sub(payment.ledger_version) + 1)
            .unwrap_or(1);
        let amount = payment
            .balance_changes
            .get(&payment.destination.address)
            .and_then(|changes| changes.iter().find(|c| c.currency == self.config.symbol))
            .map(|c| c.value)
            .unwrap_or_default();
        Ok(TransactionInfo {
            id: payment.id.clone(),
            amount,
            fee: payment.fee,
            is_confirmed: payment.successful,
            confirmations,
            block_id: Some(ledger.ledger_hash),
            block_height: Some(payment.ledger_version),
            timestamp: Some(ledger.close_time),
        })
    }

    fn uses_utxos(&self) -> bool {
        false
    }

    fn uses_sequence_number(&self) -> bool {
        true
    }

    fn requires_balance_monitor(&self) -> bool {
        true
    }
}
