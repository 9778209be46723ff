use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityDirection {
    In,
    Out,
}

impl ActivityDirection {
    /// Tertiary component of the activity sequence; outs sort before ins
    /// at the same (ledger, index).
    fn sequence_tag(self) -> &'static str {
        match self {
            ActivityDirection::Out => "00",
            ActivityDirection::In => "01",
        }
    }
}

/// A single inbound or outbound movement on an address, uniform across
/// ledger families.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceActivity {
    pub direction: ActivityDirection,
    pub network_type: NetworkType,
    pub asset_symbol: String,
    pub address: String,
    pub extra_id: Option<String>,
    /// Signed main-denomination amount; negative for outbound.
    pub amount: Decimal,
    /// Transaction id on the underlying chain.
    pub external_id: String,
    pub activity_sequence: String,
    /// Hash of the confirming block/ledger.
    pub confirmation_id: String,
    pub confirmation_number: u64,
    /// Close time of the confirming ledger, seconds since the Unix epoch.
    pub timestamp: u64,
}

/// Lexicographically sortable string giving a total order across all
/// activities of an address, independent of wall-clock time.
pub fn activity_sequence(
    confirmation_number: u64,
    index_in_block: u64,
    direction: ActivityDirection,
) -> String {
    format!(
        "{confirmation_number:012}.{index_in_block:08}.{}",
        direction.sequence_tag()
    )
}
