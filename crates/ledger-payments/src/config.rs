use payments_core::{Denomination, NetworkType, PaymentError};
use rust_decimal::Decimal;

/// Per-asset configuration for an account-ledger instance; immutable once
/// the payments instance owns it.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    pub network: NetworkType,
    pub symbol: String,
    pub decimals: u32,
    /// Reserve that must remain in an account for it to exist on ledger
    /// (main denomination).
    pub min_balance: Decimal,
}

impl LedgerConfig {
    pub fn new(network: NetworkType, symbol: impl Into<String>, decimals: u32) -> Self {
        Self {
            network,
            symbol: symbol.into(),
            decimals,
            min_balance: Decimal::ZERO,
        }
    }

    pub fn with_min_balance(mut self, min_balance: Decimal) -> Self {
        self.min_balance = min_balance;
        self
    }

    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.decimals > 18 {
            return Err(PaymentError::InvalidAmount(format!(
                "unsupported decimal count {}",
                self.decimals
            )));
        }
        if self.min_balance.is_sign_negative() {
            return Err(PaymentError::InvalidAmount(format!(
                "negative minimum balance {}",
                self.min_balance
            )));
        }
        Ok(())
    }

    pub fn denomination(&self) -> Denomination {
        Denomination::new(self.decimals)
    }
}
