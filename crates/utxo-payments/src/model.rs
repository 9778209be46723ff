use payments_core::Denomination;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A spendable output as reported by the node facade. Value is carried in
/// both denominations for convenience; base units are authoritative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UtxoInfo {
    pub txid: String,
    pub vout: u32,
    pub value_base: u64,
    pub value_main: Decimal,
    pub height: Option<u64>,
    pub lock_time: Option<u64>,
    pub script_pub_key: Option<String>,
    pub address: Option<String>,
}

impl UtxoInfo {
    pub fn new(txid: impl Into<String>, vout: u32, value_base: u64, denom: &Denomination) -> Self {
        Self {
            txid: txid.into(),
            vout,
            value_base,
            value_main: denom.base_to_main(value_base),
            height: None,
            lock_time: None,
            script_pub_key: None,
            address: None,
        }
    }

    pub fn with_height(mut self, height: u64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.height, Some(h) if h > 0)
    }
}

/// A validated external output in base units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub address: String,
    pub value_base: u64,
}

/// An output as it appears in a finished plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannedOutput {
    pub address: String,
    pub value_base: u64,
    pub value_main: Decimal,
}

/// Immutable planning result, handed to an external signer.
///
/// Inputs are in selection order; external outputs precede change outputs,
/// and change outputs are weight-ascending. Value conservation holds:
/// inputs = externals + changes + fee, exactly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub inputs: Vec<UtxoInfo>,
    pub external_outputs: Vec<PlannedOutput>,
    pub change_outputs: Vec<PlannedOutput>,
    pub fee_base: u64,
    pub fee_main: Decimal,
    pub total_change_base: u64,
    pub total_change_main: Decimal,
    /// Serialized unsigned transaction from the injected serializer.
    pub hex: String,
    /// Hash of `hex`.
    pub id: String,
}

/// Externally signed transaction ready for broadcast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub id: String,
    pub hex: String,
}

/// Output of the injected plan serializer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializedTx {
    pub hex: String,
    pub id: String,
}
