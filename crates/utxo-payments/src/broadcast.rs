use log::warn;
use payments_core::{BroadcastResult, PaymentError};

use crate::model::SignedTransaction;
use crate::node::UtxoNode;

/// Submit signed bytes through the node facade. A mempool-duplicate
/// response means somebody (possibly us, retrying) already broadcast the
/// transaction, so it is reported as success with the known txid.
pub fn broadcast_signed<N: UtxoNode + ?Sized>(
    node: &N,
    signed: &SignedTransaction,
) -> Result<BroadcastResult, PaymentError> {
    match node.send_tx(&signed.hex) {
        Ok(id) => Ok(BroadcastResult { id }),
        Err(err) if err.is_mempool_duplicate() => {
            warn!(
                "transaction {} already in mempool; reporting broadcast as success",
                signed.id
            );
            Ok(BroadcastResult {
                id: signed.id.clone(),
            })
        }
        Err(err) => Err(err.into()),
    }
}
