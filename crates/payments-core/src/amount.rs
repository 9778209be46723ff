//! Main <-> base denomination arithmetic.
//!
//! All monetary math inside the engine runs on integer base units; decimals
//! appear only at the contract boundary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::PaymentError;

/// Conversion factor between the human-facing main denomination and the
/// smallest indivisible base unit of an asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Denomination {
    decimals: u32,
}

impl Denomination {
    pub fn new(decimals: u32) -> Self {
        Self { decimals }
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    fn base_factor(&self) -> Decimal {
        Decimal::from_i128_with_scale(10i128.pow(self.decimals), 0)
    }

    /// Strict main -> base conversion. Fails with `InvalidAmount` when the
    /// value is negative or carries a fractional part finer than one base
    /// unit.
    pub fn main_to_base(&self, main: Decimal) -> Result<u64, PaymentError> {
        if main.is_sign_negative() {
            return Err(PaymentError::InvalidAmount(format!("negative amount {main}")));
        }
        if main.normalize().scale() > self.decimals {
            return Err(PaymentError::InvalidAmount(format!(
                "amount {main} has sub-base-unit precision (max {} decimals)",
                self.decimals
            )));
        }
        let scaled = main
            .checked_mul(self.base_factor())
            .ok_or_else(|| PaymentError::InvalidAmount(format!("amount {main} out of range")))?;
        scaled
            .to_u64()
            .ok_or_else(|| PaymentError::InvalidAmount(format!("amount {main} exceeds base-unit range")))
    }

    /// Directed-rounding main -> base conversion for internally derived
    /// values: multiplies by 10^decimals and floors.
    pub fn main_to_base_floor(&self, main: Decimal) -> Result<u64, PaymentError> {
        if main.is_sign_negative() {
            return Err(PaymentError::InvalidAmount(format!("negative amount {main}")));
        }
        let scaled = main
            .checked_mul(self.base_factor())
            .ok_or_else(|| PaymentError::InvalidAmount(format!("amount {main} out of range")))?;
        scaled
            .floor()
            .to_u64()
            .ok_or_else(|| PaymentError::InvalidAmount(format!("amount {main} exceeds base-unit range")))
    }

    /// Exact base -> main conversion.
    pub fn base_to_main(&self, base: u64) -> Decimal {
        Decimal::from_i128_with_scale(base as i128, self.decimals).normalize()
    }

    /// Signed base -> main conversion for balance deltas.
    pub fn base_to_main_signed(&self, base: i128) -> Decimal {
        Decimal::from_i128_with_scale(base, self.decimals).normalize()
    }

    /// Convert a base-denominated decimal (e.g. a fee rate expressed in
    /// base units) to main denomination.
    pub fn base_decimal_to_main(&self, base: Decimal) -> Decimal {
        (base / self.base_factor()).normalize()
    }

    /// Parse an unsigned base-unit string as reported by node facades.
    pub fn parse_base_str(&self, raw: &str) -> Result<u64, PaymentError> {
        raw.trim()
            .parse::<u64>()
            .map_err(|_| PaymentError::InvalidAmount(format!("malformed base-unit value {raw:?}")))
    }

    /// Parse a signed base-unit string (unconfirmed balances may be
    /// negative while a spend is pending).
    pub fn parse_base_str_signed(&self, raw: &str) -> Result<i128, PaymentError> {
        raw.trim()
            .parse::<i128>()
            .map_err(|_| PaymentError::InvalidAmount(format!("malformed base-unit value {raw:?}")))
    }

    /// Parse a main-denomination decimal string.
    pub fn parse_main(&self, raw: &str) -> Result<Decimal, PaymentError> {
        raw.trim()
            .parse::<Decimal>()
            .map_err(|_| PaymentError::InvalidAmount(format!("malformed amount {raw:?}")))
    }
}
