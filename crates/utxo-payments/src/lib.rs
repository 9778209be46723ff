//! utxo-payments — coin selection, fee estimation and change splitting
//! for UTXO-based ledgers.
//!
//! Pieces:
//! - UtxoConfig: dust/relay/pool policy per coin
//! - UtxoChain: injected per-coin capability record (addresses, size
//!   model, plan serialization)
//! - UtxoNode: injected block-explorer facade
//! - TxPlanner: the deterministic selector and planner
//! - split_change: weighted change schedules for pool maintenance
//! - broadcast_signed: mempool-duplicate-tolerant submission
//! - UtxoPayments: the payment contract wired over the above
//!
//! Planning is pure and synchronous; only facade calls suspend.

pub mod broadcast;
pub mod chain;
pub mod change;
pub mod config;
pub mod model;
pub mod node;
pub mod payments;
pub mod planner;

pub use broadcast::broadcast_signed;
pub use chain::UtxoChain;
pub use change::{split_change, ChangeSplit};
pub use config::{UtxoConfig, MAX_TARGET_POOL_SIZE};
pub use model::{PaymentPlan, PlannedOutput, SerializedTx, SignedTransaction, TxOutput, UtxoInfo};
pub use node::{AddressDetails, NodeTxInfo, UtxoNode};
pub use payments::UtxoPayments;
pub use planner::{sort_utxos, PlanRequest, TxPlanner};
