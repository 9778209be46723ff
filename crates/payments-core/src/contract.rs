use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::PaymentError;
use crate::fees::FeeOption;
use crate::payport::Payport;

/// Uniform balance result across both ledger families.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub confirmed: Decimal,
    pub unconfirmed: Decimal,
    pub spendable: Decimal,
    pub sweepable: bool,
    /// Chains with account reserves report true until the account holds
    /// enough to exist on ledger.
    pub requires_activation: bool,
}

impl Balance {
    pub fn inactive() -> Self {
        Self {
            confirmed: Decimal::ZERO,
            unconfirmed: Decimal::ZERO,
            spendable: Decimal::ZERO,
            sweepable: false,
            requires_activation: true,
        }
    }
}

/// Uniform transaction lookup result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub id: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub is_confirmed: bool,
    pub confirmations: u64,
    pub block_id: Option<String>,
    pub block_height: Option<u64>,
    pub timestamp: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub id: String,
}

/// Options shared by the `create_*` constructors.
#[derive(Clone, Debug, Default)]
pub struct CreateOptions {
    /// Fee selection; `None` resolves as `FeeLevel::Normal`.
    pub fee: Option<FeeOption>,
    /// Allow spending outputs that are not yet confirmed (UTXO family).
    pub use_unconfirmed: bool,
}

/// Behavioral contract implemented by every payment family.
///
/// Suspending operations take a [`CancelToken`] and honor it at every
/// I/O boundary; a cancelled call leaves no partial plan visible. All
/// external amounts are main-denomination decimals.
pub trait Payments {
    /// Unsigned transaction plan handed to an external signer.
    type Plan;
    /// Signed artifact accepted by `broadcast_transaction`.
    type Signed;

    fn get_balance(&self, payport: &Payport, cancel: &CancelToken) -> Result<Balance, PaymentError>;

    fn create_transaction(
        &self,
        from: &Payport,
        to: &Payport,
        amount: Decimal,
        options: &CreateOptions,
        cancel: &CancelToken,
    ) -> Result<Self::Plan, PaymentError>;

    fn create_multi_output_transaction(
        &self,
        from: &Payport,
        outputs: &[(Payport, Decimal)],
        options: &CreateOptions,
        cancel: &CancelToken,
    ) -> Result<Self::Plan, PaymentError>;

    /// Spend all available value to `to`, deducting the fee from the
    /// swept amount.
    fn create_sweep_transaction(
        &self,
        from: &Payport,
        to: &Payport,
        options: &CreateOptions,
        cancel: &CancelToken,
    ) -> Result<Self::Plan, PaymentError>;

    fn broadcast_transaction(
        &self,
        signed: &Self::Signed,
        cancel: &CancelToken,
    ) -> Result<BroadcastResult, PaymentError>;

    fn get_transaction_info(
        &self,
        txid: &str,
        cancel: &CancelToken,
    ) -> Result<TransactionInfo, PaymentError>;

    fn uses_utxos(&self) -> bool;
    fn uses_sequence_number(&self) -> bool;
    fn requires_balance_monitor(&self) -> bool;
}
