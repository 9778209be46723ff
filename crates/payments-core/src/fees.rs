use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeLevel {
    Slow,
    Normal,
    Fast,
    Custom,
}

/// Unit tag attached to a fee rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeRateType {
    /// Base units per weight/vbyte; multiplied by the estimated size.
    BasePerWeight,
    /// A flat fee in base units.
    Base,
    /// A flat fee in main denomination.
    Main,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeeRate {
    pub rate: Decimal,
    pub rate_type: FeeRateType,
}

impl FeeRate {
    pub fn new(rate: Decimal, rate_type: FeeRateType) -> Self {
        Self { rate, rate_type }
    }
}

/// Caller-side fee selection: a named level or an explicit rate.
#[derive(Clone, Debug, PartialEq)]
pub enum FeeOption {
    Level(FeeLevel),
    Custom(FeeRate),
}

/// Outcome of fee-policy resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedFeeOption {
    pub target_fee_level: FeeLevel,
    pub target_fee_rate: Decimal,
    pub target_fee_rate_type: FeeRateType,
}

/// Coin-specific fee recommendation source; answers pass through
/// resolution unchanged.
pub trait FeeOracle: Send + Sync {
    fn recommended_rate(&self, level: FeeLevel) -> Result<FeeRate, PaymentError>;
}

/// Oracle returning one configured rate for every level.
pub struct FixedFeeOracle {
    pub rate: FeeRate,
}

impl FeeOracle for FixedFeeOracle {
    fn recommended_rate(&self, _level: FeeLevel) -> Result<FeeRate, PaymentError> {
        Ok(self.rate.clone())
    }
}

pub fn resolve_fee_option<O: FeeOracle + ?Sized>(
    oracle: &O,
    option: &FeeOption,
) -> Result<ResolvedFeeOption, PaymentError> {
    match option {
        FeeOption::Level(level) => {
            if *level == FeeLevel::Custom {
                return Err(PaymentError::InvalidAmount(
                    "custom fee level requires an explicit fee rate".into(),
                ));
            }
            let rate = oracle.recommended_rate(*level)?;
            Ok(ResolvedFeeOption {
                target_fee_level: *level,
                target_fee_rate: rate.rate,
                target_fee_rate_type: rate.rate_type,
            })
        }
        FeeOption::Custom(rate) => {
            if rate.rate.is_sign_negative() {
                return Err(PaymentError::InvalidAmount(format!(
                    "negative fee rate {}",
                    rate.rate
                )));
            }
            Ok(ResolvedFeeOption {
                target_fee_level: FeeLevel::Custom,
                target_fee_rate: rate.rate,
                target_fee_rate_type: rate.rate_type,
            })
        }
    }
}
