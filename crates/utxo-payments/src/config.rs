use payments_core::{Denomination, FeeRate, NetworkType, PaymentError};
use rust_decimal::Decimal;

/// Largest supported UTXO-pool target; bounds the change-weight schedule.
pub const MAX_TARGET_POOL_SIZE: usize = 32;

/// Per-coin configuration; immutable once the payments instance owns it.
#[derive(Clone, Debug)]
pub struct UtxoConfig {
    pub network: NetworkType,
    pub symbol: String,
    pub decimals: u32,
    /// Optional rate-denominated floor on every computed fee.
    pub min_tx_fee: Option<FeeRate>,
    /// Absolute lower bound on any fee, in base units.
    pub network_min_relay_fee: u64,
    /// Outputs at or below this value are never emitted.
    pub dust_threshold: u64,
    /// Desired number of spendable outputs to keep in the pool.
    pub target_utxo_pool_size: usize,
    /// Change below this main-denomination value is dropped.
    pub min_change: Decimal,
}

impl UtxoConfig {
    pub fn new(network: NetworkType, symbol: impl Into<String>, decimals: u32) -> Self {
        Self {
            network,
            symbol: symbol.into(),
            decimals,
            min_tx_fee: None,
            network_min_relay_fee: 1_000,
            dust_threshold: 546,
            target_utxo_pool_size: 1,
            min_change: Decimal::ZERO,
        }
    }

    pub fn with_min_tx_fee(mut self, rate: FeeRate) -> Self {
        self.min_tx_fee = Some(rate);
        self
    }

    pub fn with_network_min_relay_fee(mut self, fee_base: u64) -> Self {
        self.network_min_relay_fee = fee_base;
        self
    }

    pub fn with_dust_threshold(mut self, dust_base: u64) -> Self {
        self.dust_threshold = dust_base;
        self
    }

    pub fn with_target_utxo_pool_size(mut self, size: usize) -> Self {
        self.target_utxo_pool_size = size;
        self
    }

    pub fn with_min_change(mut self, min_change_main: Decimal) -> Self {
        self.min_change = min_change_main;
        self
    }

    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.decimals > 18 {
            return Err(PaymentError::InvalidAmount(format!(
                "unsupported decimal count {}",
                self.decimals
            )));
        }
        if self.target_utxo_pool_size == 0 || self.target_utxo_pool_size > MAX_TARGET_POOL_SIZE {
            return Err(PaymentError::InvalidAmount(format!(
                "target UTXO pool size must be 1..={MAX_TARGET_POOL_SIZE}, got {}",
                self.target_utxo_pool_size
            )));
        }
        if self.min_change.is_sign_negative() {
            return Err(PaymentError::InvalidAmount(format!(
                "negative minimum change {}",
                self.min_change
            )));
        }
        if let Some(rate) = &self.min_tx_fee {
            if rate.rate.is_sign_negative() {
                return Err(PaymentError::InvalidAmount(format!(
                    "negative minimum tx fee rate {}",
                    rate.rate
                )));
            }
        }
        Ok(())
    }

    pub fn denomination(&self) -> Denomination {
        Denomination::new(self.decimals)
    }

    /// Minimum change in base units, floored.
    pub fn min_change_base(&self) -> Result<u64, PaymentError> {
        self.denomination().main_to_base_floor(self.min_change)
    }
}
