//! ledger-payments — balance-activity scanning and payments for
//! account-based ledgers.
//!
//! Pieces:
//! - LedgerConfig: symbol/decimals/reserve per asset
//! - LedgerNode: injected server facade (connection, history pages,
//!   ledger lookups, generic request, push subscription)
//! - ActivityScanner: ledger-window history reconstruction with the
//!   total-order activity sequence
//! - BalanceMonitor / ActivityStream: push-event bridge into the same
//!   activity model
//! - LedgerPayments: the payment contract over sequence-numbered accounts
//!
//! Reads go through the shared retry policy; every suspending operation
//! honors the caller's cancellation token.

pub mod bridge;
pub mod classify;
pub mod config;
pub mod model;
pub mod node;
pub mod payments;
pub mod scanner;

pub use bridge::{ActivityStream, BalanceMonitor};
pub use classify::{build_activity, classify_payment, ClassifiedPayment};
pub use config::LedgerConfig;
pub use model::{
    ActivityBound, AssetAmount, LedgerInfo, LedgerPayment, LedgerPaymentPlan, LedgerRange,
    PaymentEndpoint, ServerInfo, SignedLedgerTransaction,
};
pub use node::{LedgerNode, TxPageOptions};
pub use payments::LedgerPayments;
pub use scanner::{ActivityScanner, ActivitySink, ACTIVITY_PAGE_SIZE};
