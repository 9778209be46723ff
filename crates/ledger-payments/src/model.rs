use std::collections::HashMap;

use payments_core::{BalanceActivity, NetworkType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One side of a payment as reported by the ledger server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEndpoint {
    pub address: String,
    /// Destination tag / memo, where the chain uses one.
    pub tag: Option<String>,
}

/// A single asset movement inside a transaction's balance changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetAmount {
    pub currency: String,
    /// Signed main-denomination delta.
    pub value: Decimal,
}

/// A payment transaction returned by the history API or pushed over the
/// server's subscription stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerPayment {
    pub id: String,
    pub ledger_version: u64,
    pub index_in_ledger: u64,
    pub source: PaymentEndpoint,
    pub destination: PaymentEndpoint,
    pub successful: bool,
    /// Network fee paid by the source, main denomination.
    pub fee: Decimal,
    /// Address -> per-asset signed balance deltas.
    pub balance_changes: HashMap<String, Vec<AssetAmount>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Retained history as reported by the server, e.g. "32570-38329".
    pub complete_ledgers: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerInfo {
    pub ledger_hash: String,
    /// Close time, seconds since the Unix epoch.
    pub close_time: u64,
}

/// Inclusive ledger window actually scanned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerRange {
    pub from: u64,
    pub to: u64,
}

/// Caller-facing bound for a scan window: a raw ledger height or a
/// previously observed activity record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityBound {
    Height(u64),
    ConfirmationNumber(u64),
}

impl ActivityBound {
    pub fn ledger(&self) -> u64 {
        match self {
            ActivityBound::Height(h) | ActivityBound::ConfirmationNumber(h) => *h,
        }
    }
}

impl From<u64> for ActivityBound {
    fn from(height: u64) -> Self {
        ActivityBound::Height(height)
    }
}

impl From<&BalanceActivity> for ActivityBound {
    fn from(activity: &BalanceActivity) -> Self {
        ActivityBound::ConfirmationNumber(activity.confirmation_number)
    }
}

/// Unsigned account-ledger payment; an external signer turns it into a
/// submittable blob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerPaymentPlan {
    pub from_address: String,
    pub to_address: String,
    pub to_extra_id: Option<String>,
    pub amount: Decimal,
    pub fee: Decimal,
    pub sequence: u64,
    pub network: NetworkType,
    pub asset_symbol: String,
}

/// Externally signed ledger transaction ready for submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedLedgerTransaction {
    pub id: String,
    pub tx_blob: String,
}
