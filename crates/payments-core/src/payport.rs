use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

/// Destination handle accepted at the contract boundary: an account index,
/// a raw address, or an address plus the destination tag / memo some
/// chains require.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payport {
    Index(u64),
    Address(String),
    Detailed {
        address: String,
        extra_id: Option<String>,
    },
}

impl Payport {
    pub fn index(index: u64) -> Self {
        Payport::Index(index)
    }

    pub fn address(address: impl Into<String>) -> Self {
        Payport::Address(address.into())
    }

    pub fn detailed(address: impl Into<String>, extra_id: Option<String>) -> Self {
        Payport::Detailed {
            address: address.into(),
            extra_id,
        }
    }
}

/// A payport resolved to a chain-validated address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPayport {
    pub address: String,
    pub extra_id: Option<String>,
}

/// Chain-specific address capabilities injected by the embedding wallet.
pub trait AddressScheme: Send + Sync {
    fn validate_address(&self, address: &str) -> bool;
    fn derive_address(&self, index: u64) -> Result<String, PaymentError>;
}

/// Resolve a payport reference into a validated `{address, extra_id}`.
/// Pure apart from the injected deriver.
pub fn resolve_payport<S: AddressScheme + ?Sized>(
    scheme: &S,
    payport: &Payport,
) -> Result<ResolvedPayport, PaymentError> {
    match payport {
        Payport::Index(index) => {
            let address = scheme.derive_address(*index)?;
            if !scheme.validate_address(&address) {
                return Err(PaymentError::InvalidAddress(format!(
                    "derived address {address} for account index {index} failed validation"
                )));
            }
            Ok(ResolvedPayport {
                address,
                extra_id: None,
            })
        }
        Payport::Address(address) => {
            if !scheme.validate_address(address) {
                return Err(PaymentError::InvalidAddress(address.clone()));
            }
            Ok(ResolvedPayport {
                address: address.clone(),
                extra_id: None,
            })
        }
        Payport::Detailed { address, extra_id } => {
            if !scheme.validate_address(address) {
                return Err(PaymentError::InvalidAddress(address.clone()));
            }
            Ok(ResolvedPayport {
                address: address.clone(),
                extra_id: extra_id.clone(),
            })
        }
    }
}
