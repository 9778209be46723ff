//! Deterministic coin selection and transaction planning.
//!
//! Planning is pure: no I/O, no randomness, no clock. Given identical
//! inputs the planner returns identical plans.

use log::warn;
use payments_core::{FeeRate, FeeRateType, PaymentError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::chain::UtxoChain;
use crate::change::split_change;
use crate::config::UtxoConfig;
use crate::model::{PaymentPlan, PlannedOutput, TxOutput, UtxoInfo};

/// Inputs to a single planning run. UTXO records are owned by the caller
/// and passed by value; the resulting plan is owned by the caller.
#[derive(Clone, Debug)]
pub struct PlanRequest {
    pub unused_utxos: Vec<UtxoInfo>,
    pub desired_outputs: Vec<TxOutput>,
    pub change_address: String,
    pub fee_rate: FeeRate,
    /// Sweep mode: every surviving UTXO enters the input set and no
    /// change output is produced.
    pub use_all_utxos: bool,
    pub use_unconfirmed_utxos: bool,
}

/// Selection preference order: confirmed before unconfirmed, larger
/// values first, `(txid, vout)` ascending as the deterministic tie-break.
pub fn sort_utxos(utxos: &mut [UtxoInfo]) {
    utxos.sort_by(|a, b| {
        b.is_confirmed()
            .cmp(&a.is_confirmed())
            .then(b.value_base.cmp(&a.value_base))
            .then_with(|| a.txid.cmp(&b.txid))
            .then(a.vout.cmp(&b.vout))
    });
}

struct Selection {
    inputs: Vec<UtxoInfo>,
    input_total: u64,
    fee: u64,
    /// Zero marks the no-change paths (sweep, ideal-single-input).
    target_change_count: usize,
}

pub struct TxPlanner<'a, C: UtxoChain> {
    chain: &'a C,
    config: &'a UtxoConfig,
}

impl<'a, C: UtxoChain> TxPlanner<'a, C> {
    pub fn new(chain: &'a C, config: &'a UtxoConfig) -> Self {
        Self { chain, config }
    }

    pub fn plan(&self, request: &PlanRequest) -> Result<PaymentPlan, PaymentError> {
        let dust = self.config.dust_threshold;
        if request.desired_outputs.is_empty() {
            return Err(PaymentError::InvalidAmount(
                "a transaction requires at least one output".into(),
            ));
        }
        if request.fee_rate.rate.is_sign_negative() {
            return Err(PaymentError::InvalidAmount(format!(
                "negative fee rate {}",
                request.fee_rate.rate
            )));
        }
        for output in &request.desired_outputs {
            if output.value_base == 0 {
                return Err(PaymentError::InvalidAmount(format!(
                    "output to {} must be positive",
                    output.address
                )));
            }
            if output.value_base <= dust {
                return Err(PaymentError::DustOutput {
                    value: output.value_base,
                    dust_threshold: dust,
                });
            }
            if !self.chain.validate_address(&output.address) {
                return Err(PaymentError::InvalidAddress(output.address.clone()));
            }
        }
        if !self.chain.validate_address(&request.change_address) {
            return Err(PaymentError::InvalidAddress(request.change_address.clone()));
        }

        let candidates: Vec<UtxoInfo> = if request.use_unconfirmed_utxos {
            request.unused_utxos.clone()
        } else {
            request
                .unused_utxos
                .iter()
                .filter(|u| u.is_confirmed())
                .cloned()
                .collect()
        };

        let mut output_total = 0u64;
        for output in &request.desired_outputs {
            output_total = output_total.checked_add(output.value_base).ok_or_else(|| {
                PaymentError::InvalidAmount("desired outputs exceed representable value".into())
            })?;
        }
        let external_count = request.desired_outputs.len();

        let selection = if request.use_all_utxos {
            self.select_sweep(&request.fee_rate, candidates, external_count)
        } else {
            self.select_targeted(&request.fee_rate, candidates, output_total, external_count)?
        };
        let Selection {
            inputs,
            input_total,
            mut fee,
            target_change_count,
        } = selection;

        let mut external_outputs = request.desired_outputs.clone();
        if output_total.saturating_add(fee) > input_total {
            if output_total == input_total {
                // The caller is sending the full balance; deduct the fee
                // from the external outputs instead.
                let share = fee.div_ceil(external_count as u64);
                fee = share * external_count as u64;
                for output in &mut external_outputs {
                    let reduced = output.value_base.saturating_sub(share);
                    if output.value_base < share || reduced <= dust {
                        return Err(PaymentError::DustOutput {
                            value: reduced,
                            dust_threshold: dust,
                        });
                    }
                    output.value_base = reduced;
                }
            } else {
                return Err(PaymentError::InsufficientFunds {
                    required: output_total.saturating_add(fee),
                    available: input_total,
                });
            }
        }

        let external_total: u64 = external_outputs.iter().map(|o| o.value_base).sum();
        let spent = external_total.checked_add(fee).ok_or_else(|| {
            PaymentError::InvariantViolation("output plus fee total overflowed".into())
        })?;
        if spent > input_total {
            return Err(PaymentError::InvariantViolation(format!(
                "outputs plus fee {spent} exceed selected inputs {input_total}"
            )));
        }
        let total_change = input_total - spent;

        let mut change_values: Vec<u64> = Vec::new();
        if target_change_count > 0 && total_change > 0 {
            let floor = dust.max(self.config.min_change_base()?);
            let split = split_change(total_change, target_change_count, floor);
            change_values = split.outputs;
            let mut loose = split.loose;

            // The fee was estimated against the target change count;
            // settle it against what actually survived.
            let actual_count = change_values.len().max(1);
            let recomputed =
                self.estimate_fee(&request.fee_rate, inputs.len(), actual_count, external_count);
            if recomputed < fee {
                loose += fee - recomputed;
                fee = recomputed;
            }

            if !change_values.is_empty() && loose >= change_values.len() as u64 {
                let per_output = loose / change_values.len() as u64;
                for value in &mut change_values {
                    *value += per_output;
                }
                loose -= per_output * change_values.len() as u64;
            } else if change_values.is_empty() && loose > floor {
                change_values.push(loose);
                loose = 0;
            }
            // Residue too small to matter anywhere else.
            fee += loose;
        } else if total_change > 0 {
            if request.use_all_utxos {
                warn!(
                    "sweep residual of {total_change} base units beyond desired outputs absorbed into fee"
                );
            }
            fee += total_change;
        }

        self.assemble(request, inputs, external_outputs, change_values, fee)
    }

    fn select_sweep(
        &self,
        rate: &FeeRate,
        candidates: Vec<UtxoInfo>,
        external_count: usize,
    ) -> Selection {
        let input_total = candidates.iter().map(|u| u.value_base).sum();
        let fee = self.estimate_fee(rate, candidates.len(), 0, external_count);
        Selection {
            inputs: candidates,
            input_total,
            fee,
            target_change_count: 0,
        }
    }

    fn select_targeted(
        &self,
        rate: &FeeRate,
        candidates: Vec<UtxoInfo>,
        output_total: u64,
        external_count: usize,
    ) -> Result<Selection, PaymentError> {
        // Ideal-single-input probe, in the caller-provided order: a lone
        // UTXO whose excess over outputs-plus-fee would have been dust
        // makes a cheaper transaction with no change at all.
        let fee_single = self.estimate_fee(rate, 1, 0, external_count);
        let ideal_min = output_total.checked_add(fee_single).ok_or_else(|| {
            PaymentError::InvalidAmount("desired outputs exceed representable value".into())
        })?;
        let ideal_max = ideal_min.saturating_add(self.config.dust_threshold);
        for utxo in &candidates {
            if utxo.value_base >= ideal_min && utxo.value_base <= ideal_max {
                return Ok(Selection {
                    inputs: vec![utxo.clone()],
                    input_total: utxo.value_base,
                    fee: fee_single,
                    target_change_count: 0,
                });
            }
        }

        // Incremental accumulation over the sorted candidate set. The
        // change-output target tops the pool back up as inputs leave it,
        // and the fee tracks the evolving transaction shape.
        let mut sorted = candidates;
        sort_utxos(&mut sorted);
        let unused_count = sorted.len();
        let mut inputs: Vec<UtxoInfo> = Vec::new();
        let mut input_total = 0u64;
        let mut fee = fee_single;
        let mut target_change_count = 1usize;
        for utxo in sorted {
            input_total = input_total.saturating_add(utxo.value_base);
            inputs.push(utxo);
            target_change_count = self
                .config
                .target_utxo_pool_size
                .saturating_sub(unused_count - inputs.len())
                .max(1);
            fee = self.estimate_fee(rate, inputs.len(), target_change_count, external_count);
            if input_total >= output_total.saturating_add(fee) {
                break;
            }
        }
        // An exhausted iterator is not an error here; the caller observes
        // the shortfall against the final fee estimate.
        Ok(Selection {
            inputs,
            input_total,
            fee,
            target_change_count,
        })
    }

    /// Fee for a hypothetical transaction shape, clamped from below by
    /// the configured minimum rate and the network relay floor, then
    /// ceiled to whole base units.
    fn estimate_fee(
        &self,
        rate: &FeeRate,
        input_count: usize,
        change_count: usize,
        external_count: usize,
    ) -> u64 {
        let size = self
            .chain
            .estimate_size(input_count, change_count + external_count);
        let mut fee = rate_fee(rate, size, self.config.decimals);
        if let Some(min_rate) = &self.config.min_tx_fee {
            let min_fee = rate_fee(min_rate, size, self.config.decimals);
            if fee < min_fee {
                fee = min_fee;
            }
        }
        let relay_floor = Decimal::from(self.config.network_min_relay_fee);
        if fee < relay_floor {
            fee = relay_floor;
        }
        fee.ceil().to_u64().unwrap_or(u64::MAX)
    }

    fn assemble(
        &self,
        request: &PlanRequest,
        inputs: Vec<UtxoInfo>,
        external_outputs: Vec<TxOutput>,
        change_values: Vec<u64>,
        fee: u64,
    ) -> Result<PaymentPlan, PaymentError> {
        let denom = self.config.denomination();
        let dust = self.config.dust_threshold;

        let external_planned: Vec<PlannedOutput> = external_outputs
            .iter()
            .map(|o| PlannedOutput {
                address: o.address.clone(),
                value_base: o.value_base,
                value_main: denom.base_to_main(o.value_base),
            })
            .collect();
        // split_change emits shares weight-ascending, so this ordering is
        // already canonical.
        let change_planned: Vec<PlannedOutput> = change_values
            .iter()
            .map(|&value| PlannedOutput {
                address: request.change_address.clone(),
                value_base: value,
                value_main: denom.base_to_main(value),
            })
            .collect();
        let total_change_base: u64 = change_values.iter().sum();

        let input_total: u64 = inputs.iter().map(|u| u.value_base).sum();
        let external_total: u64 = external_outputs.iter().map(|o| o.value_base).sum();
        let accounted = external_total
            .checked_add(total_change_base)
            .and_then(|v| v.checked_add(fee));
        if accounted != Some(input_total) {
            return Err(PaymentError::InvariantViolation(format!(
                "plan does not conserve value: inputs {input_total}, outputs {external_total} + change {total_change_base} + fee {fee}"
            )));
        }
        for output in external_planned.iter().chain(change_planned.iter()) {
            if output.value_base <= dust {
                return Err(PaymentError::InvariantViolation(format!(
                    "planned output of {} base units at or below dust threshold {dust}",
                    output.value_base
                )));
            }
        }

        let mut all_outputs = external_planned.clone();
        all_outputs.extend(change_planned.iter().cloned());
        let serialized = self.chain.serialize(&inputs, &all_outputs)?;

        Ok(PaymentPlan {
            inputs,
            external_outputs: external_planned,
            change_outputs: change_planned,
            fee_base: fee,
            fee_main: denom.base_to_main(fee),
            total_change_base,
            total_change_main: denom.base_to_main(total_change_base),
            hex: serialized.hex,
            id: serialized.id,
        })
    }
}

fn rate_fee(rate: &FeeRate, size_vbytes: u64, decimals: u32) -> Decimal {
    match rate.rate_type {
        FeeRateType::BasePerWeight => rate.rate * Decimal::from(size_vbytes),
        FeeRateType::Main => rate.rate * Decimal::from_i128_with_scale(10i128.pow(decimals), 0),
        FeeRateType::Base => rate.rate,
    }
}
