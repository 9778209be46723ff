//! payments-core — shared contract for multi-asset payment engines.
//!
//! Pieces:
//! - PaymentError / NodeError: unified error taxonomy
//! - Denomination: main <-> base unit arithmetic
//! - Payport: destination handles, resolved via an injected AddressScheme
//! - FeeOption / FeeOracle: fee-level resolution
//! - BalanceActivity: uniform activity records + total-order sequence
//! - CancelToken / RetryPolicy: cooperative cancellation and
//!   reconnect-on-disconnect for idempotent reads
//! - Payments: the behavioral contract implemented per ledger family
//!
//! This crate performs no I/O of its own; chain access is injected behind
//! traits by the family crates.

pub mod activity;
pub mod amount;
pub mod cancel;
pub mod contract;
pub mod error;
pub mod fees;
pub mod payport;
pub mod retry;

pub use activity::{activity_sequence, ActivityDirection, BalanceActivity, NetworkType};
pub use amount::Denomination;
pub use cancel::CancelToken;
pub use contract::{Balance, BroadcastResult, CreateOptions, Payments, TransactionInfo};
pub use error::{NodeError, PaymentError, MEMPOOL_DUPLICATE_SENTINEL};
pub use fees::{
    resolve_fee_option, FeeLevel, FeeOption, FeeOracle, FeeRate, FeeRateType, FixedFeeOracle,
    ResolvedFeeOption,
};
pub use payport::{resolve_payport, AddressScheme, Payport, ResolvedPayport};
pub use retry::RetryPolicy;
