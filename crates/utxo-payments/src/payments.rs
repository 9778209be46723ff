use payments_core::{
    resolve_fee_option, resolve_payport, Balance, BroadcastResult, CancelToken, CreateOptions,
    FeeLevel, FeeOption, FeeOracle, FeeRate, PaymentError, Payments, Payport, TransactionInfo,
};
use rust_decimal::Decimal;

use crate::broadcast::broadcast_signed;
use crate::chain::UtxoChain;
use crate::config::UtxoConfig;
use crate::model::{PaymentPlan, SignedTransaction, TxOutput, UtxoInfo};
use crate::node::UtxoNode;
use crate::planner::{PlanRequest, TxPlanner};

/// UTXO-family implementation of the payment contract, wiring the
/// injected chain capabilities, node facade and fee oracle together.
pub struct UtxoPayments<C: UtxoChain, N: UtxoNode, O: FeeOracle> {
    config: UtxoConfig,
    chain: C,
    node: N,
    fee_oracle: O,
}

impl<C: UtxoChain, N: UtxoNode, O: FeeOracle> UtxoPayments<C, N, O> {
    pub fn new(config: UtxoConfig, chain: C, node: N, fee_oracle: O) -> Result<Self, PaymentError> {
        config.validate()?;
        Ok(Self {
            config,
            chain,
            node,
            fee_oracle,
        })
    }

    pub fn config(&self) -> &UtxoConfig {
        &self.config
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    fn resolve_rate(&self, options: &CreateOptions) -> Result<FeeRate, PaymentError> {
        let option = options
            .fee
            .clone()
            .unwrap_or(FeeOption::Level(FeeLevel::Normal));
        let resolved = resolve_fee_option(&self.fee_oracle, &option)?;
        Ok(FeeRate::new(
            resolved.target_fee_rate,
            resolved.target_fee_rate_type,
        ))
    }

    fn fetch_utxos(
        &self,
        address: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<UtxoInfo>, PaymentError> {
        cancel.checkpoint()?;
        let utxos = self.node.get_utxos(address)?;
        cancel.checkpoint()?;
        Ok(utxos)
    }

    fn build_plan(
        &self,
        from: &Payport,
        desired_outputs: Vec<TxOutput>,
        use_all_utxos: bool,
        options: &CreateOptions,
        cancel: &CancelToken,
    ) -> Result<PaymentPlan, PaymentError> {
        let from_resolved = resolve_payport(&self.chain, from)?;
        let fee_rate = self.resolve_rate(options)?;
        let unused_utxos = self.fetch_utxos(&from_resolved.address, cancel)?;
        let request = PlanRequest {
            unused_utxos,
            desired_outputs,
            change_address: from_resolved.address,
            fee_rate,
            use_all_utxos,
            use_unconfirmed_utxos: options.use_unconfirmed,
        };
        TxPlanner::new(&self.chain, &self.config).plan(&request)
    }

    fn to_tx_output(&self, payport: &Payport, amount: Decimal) -> Result<TxOutput, PaymentError> {
        let resolved = resolve_payport(&self.chain, payport)?;
        let value_base = self.config.denomination().main_to_base(amount)?;
        if value_base == 0 {
            return Err(PaymentError::InvalidAmount(format!(
                "amount {amount} rounds to zero base units"
            )));
        }
        Ok(TxOutput {
            address: resolved.address,
            value_base,
        })
    }
}

impl<C: UtxoChain, N: UtxoNode, O: FeeOracle> Payments for UtxoPayments<C, N, O> {
    type Plan = PaymentPlan;
    type Signed = SignedTransaction;

    fn get_balance(&self, payport: &Payport, cancel: &CancelToken) -> Result<Balance, PaymentError> {
        let resolved = resolve_payport(&self.chain, payport)?;
        cancel.checkpoint()?;
        let details = self.node.get_address_details(&resolved.address)?;
        let denom = self.config.denomination();
        let confirmed_base = denom.parse_base_str(&details.balance)?;
        let unconfirmed_base = denom.parse_base_str_signed(&details.unconfirmed_balance)?;
        let confirmed = denom.base_to_main(confirmed_base);
        Ok(Balance {
            confirmed,
            unconfirmed: denom.base_to_main_signed(unconfirmed_base),
            spendable: confirmed,
            sweepable: confirmed_base > self.config.dust_threshold,
            requires_activation: false,
        })
    }

    fn create_transaction(
        &self,
        from: &Payport,
        to: &Payport,
        amount: Decimal,
        options: &CreateOptions,
        cancel: &CancelToken,
    ) -> Result<PaymentPlan, PaymentError> {
        let output = self.to_tx_output(to, amount)?;
        self.build_plan(from, vec![output], false, options, cancel)
    }

    fn create_multi_output_transaction(
        &self,
        from: &Payport,
        outputs: &[(Payport, Decimal)],
        options: &CreateOptions,
        cancel: &CancelToken,
    ) -> Result<PaymentPlan, PaymentError> {
        let mut desired = Vec::with_capacity(outputs.len());
        for (payport, amount) in outputs {
            desired.push(self.to_tx_output(payport, *amount)?);
        }
        self.build_plan(from, desired, false, options, cancel)
    }

    fn create_sweep_transaction(
        &self,
        from: &Payport,
        to: &Payport,
        options: &CreateOptions,
        cancel: &CancelToken,
    ) -> Result<PaymentPlan, PaymentError> {
        let from_resolved = resolve_payport(&self.chain, from)?;
        let to_resolved = resolve_payport(&self.chain, to)?;
        let fee_rate = self.resolve_rate(options)?;
        let unused_utxos = self.fetch_utxos(&from_resolved.address, cancel)?;
        let spendable: Vec<UtxoInfo> = if options.use_unconfirmed {
            unused_utxos
        } else {
            unused_utxos
                .into_iter()
                .filter(UtxoInfo::is_confirmed)
                .collect()
        };
        let mut total = 0u64;
        for utxo in &spendable {
            total = total.checked_add(utxo.value_base).ok_or_else(|| {
                PaymentError::InvalidAmount("spendable total exceeds representable value".into())
            })?;
        }
        if total == 0 {
            return Err(PaymentError::InsufficientFunds {
                required: 0,
                available: 0,
            });
        }
        let request = PlanRequest {
            unused_utxos: spendable,
            desired_outputs: vec![TxOutput {
                address: to_resolved.address,
                value_base: total,
            }],
            change_address: from_resolved.address,
            fee_rate,
            use_all_utxos: true,
            use_unconfirmed_utxos: true,
        };
        TxPlanner::new(&self.chain, &self.config).plan(&request)
    }

    fn broadcast_transaction(
        &self,
        signed: &SignedTransaction,
        cancel: &CancelToken,
    ) -> Result<BroadcastResult, PaymentError> {
        cancel.checkpoint()?;
        broadcast_signed(&self.node, signed)
    }

    fn get_transaction_info(
        &self,
        txid: &str,
        cancel: &CancelToken,
    ) -> Result<TransactionInfo, PaymentError> {
        cancel.checkpoint()?;
        let info = self.node.get_tx(txid)?;
        let denom = self.config.denomination();
        Ok(TransactionInfo {
            id: info.txid,
            amount: denom.base_to_main(info.value_base),
            fee: denom.base_to_main(info.fee_base),
            is_confirmed: info.confirmations > 0,
            confirmations: info.confirmations,
            block_id: info.block_hash,
            block_height: info.block_height,
            timestamp: info.block_time,
        })
    }

    fn uses_utxos(&self) -> bool {
        true
    }

    fn uses_sequence_number(&self) -> bool {
        false
    }

    fn requires_balance_monitor(&self) -> bool {
        false
    }
}
