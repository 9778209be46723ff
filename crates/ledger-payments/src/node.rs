use payments_core::NodeError;
use serde_json::Value;

use crate::model::{LedgerInfo, LedgerPayment, ServerInfo};

/// Options for one page of payment history.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxPageOptions {
    pub min_ledger_version: Option<u64>,
    pub max_ledger_version: Option<u64>,
    /// Resume from this transaction id; servers return the cursor row as
    /// the first result of the next page.
    pub start_tx: Option<String>,
    pub earliest_first: bool,
    pub exclude_failures: bool,
    pub limit: usize,
}

/// Injected server facade for the account-ledger family. Implementations
/// are assumed internally thread-safe for concurrent reads.
pub trait LedgerNode: Send + Sync {
    fn is_connected(&self) -> bool;
    fn connect(&self) -> Result<(), NodeError>;
    fn disconnect(&self) -> Result<(), NodeError>;
    /// Generic JSON-RPC escape hatch for methods without a typed wrapper
    /// (account_info, submit, ...).
    fn request(&self, method: &str, params: Value) -> Result<Value, NodeError>;
    fn get_server_info(&self) -> Result<ServerInfo, NodeError>;
    fn get_transactions(
        &self,
        address: &str,
        options: &TxPageOptions,
    ) -> Result<Vec<LedgerPayment>, NodeError>;
    fn get_transaction(&self, id: &str) -> Result<LedgerPayment, NodeError>;
    fn get_ledger(&self, ledger_version: u64) -> Result<LedgerInfo, NodeError>;
    /// Register push notifications for `addresses`.
    fn subscribe(&self, addresses: &[String]) -> Result<(), NodeError>;
    /// Drain the next pending pushed payment event, if any.
    fn next_event(&self) -> Result<Option<LedgerPayment>, NodeError>;
}
