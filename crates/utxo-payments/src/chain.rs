use payments_core::{AddressScheme, PaymentError};

use crate::model::{PlannedOutput, SerializedTx, UtxoInfo};

/// Per-coin capability record: everything chain-specific the planner and
/// contract need. The planner takes this as a parameter; there is no
/// inheritance hierarchy behind it.
pub trait UtxoChain: AddressScheme {
    /// Virtual size in vbytes for a hypothetical transaction shape.
    /// The default is the legacy pay-to-pubkey-hash model; segwit and
    /// multisig coins override it.
    fn estimate_size(&self, input_count: usize, output_count: usize) -> u64 {
        10 + 148 * input_count as u64 + 34 * output_count as u64
    }

    /// Produce the serialized unsigned transaction and its hash.
    fn serialize(
        &self,
        inputs: &[UtxoInfo],
        outputs: &[PlannedOutput],
    ) -> Result<SerializedTx, PaymentError>;
}
