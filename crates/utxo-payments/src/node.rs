use payments_core::NodeError;

use crate::model::UtxoInfo;

/// Address-level balance snapshot; base-unit strings on the wire, as
/// block explorers report them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressDetails {
    pub balance: String,
    pub unconfirmed_balance: String,
}

/// Minimal transaction record returned by `get_tx`.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeTxInfo {
    pub txid: String,
    pub value_base: u64,
    pub fee_base: u64,
    pub block_hash: Option<String>,
    pub block_height: Option<u64>,
    pub confirmations: u64,
    pub block_time: Option<u64>,
}

/// Injected block-explorer facade for the UTXO family. Implementations
/// are assumed internally thread-safe for concurrent reads.
pub trait UtxoNode: Send + Sync {
    fn get_address_details(&self, address: &str) -> Result<AddressDetails, NodeError>;
    fn get_utxos(&self, address: &str) -> Result<Vec<UtxoInfo>, NodeError>;
    fn get_tx(&self, txid: &str) -> Result<NodeTxInfo, NodeError>;
    /// Submit raw signed bytes; returns the txid, or a `-27`-prefixed
    /// server message when the transaction is already in the mempool.
    fn send_tx(&self, raw_hex: &str) -> Result<String, NodeError>;
}
