//! Shared payment classifier used by the history scanner and the
//! subscription bridge.

use log::debug;
use payments_core::{activity_sequence, ActivityDirection, BalanceActivity, NetworkType, PaymentError};
use rust_decimal::Decimal;

use crate::model::{LedgerInfo, LedgerPayment};

/// Direction and native amount extracted from a payment, before ledger
/// metadata is attached.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedPayment {
    pub direction: ActivityDirection,
    pub address: String,
    pub extra_id: Option<String>,
    /// Signed main-denomination amount; negative for outbound.
    pub amount: Decimal,
}

/// Classify `payment` relative to `address`.
///
/// `Ok(None)` means the payment concerns neither side of `address` and
/// produces no activity. A payment that does involve the address but
/// whose native-asset movement cannot be determined (no balance changes
/// recorded for it, or a token-only movement) fails with
/// `ActivityIndeterminate`; scans log and skip that error, direct
/// callers observe it.
pub fn classify_payment(
    asset_symbol: &str,
    address: &str,
    payment: &LedgerPayment,
) -> Result<Option<ClassifiedPayment>, PaymentError> {
    let (direction, extra_id) = if payment.source.address == address {
        (ActivityDirection::Out, payment.source.tag.clone())
    } else if payment.destination.address == address {
        (ActivityDirection::In, payment.destination.tag.clone())
    } else {
        debug!(
            "payment {} concerns neither side of {address}; skipping",
            payment.id
        );
        return Ok(None);
    };
    let changes = payment.balance_changes.get(address).ok_or_else(|| {
        PaymentError::ActivityIndeterminate(format!(
            "payment {} involves {address} but records no balance changes for it",
            payment.id
        ))
    })?;
    let native = changes
        .iter()
        .find(|c| c.currency == asset_symbol)
        .ok_or_else(|| {
            PaymentError::ActivityIndeterminate(format!(
                "payment {} moved no {asset_symbol} for {address} (token-only movement)",
                payment.id
            ))
        })?;
    Ok(Some(ClassifiedPayment {
        direction,
        address: address.to_string(),
        extra_id,
        amount: native.value,
    }))
}

/// Attach ledger metadata to a classified payment, producing the uniform
/// activity record.
pub fn build_activity(
    network: NetworkType,
    asset_symbol: &str,
    classified: ClassifiedPayment,
    payment: &LedgerPayment,
    ledger: &LedgerInfo,
) -> BalanceActivity {
    BalanceActivity {
        direction: classified.direction,
        network_type: network,
        asset_symbol: asset_symbol.to_string(),
        address: classified.address,
        extra_id: classified.extra_id,
        amount: classified.amount,
        external_id: payment.id.clone(),
        activity_sequence: activity_sequence(
            payment.ledger_version,
            payment.index_in_ledger,
            classified.direction,
        ),
        confirmation_id: ledger.ledger_hash.clone(),
        confirmation_number: payment.ledger_version,
        timestamp: ledger.close_time,
    }
}
