use thiserror::Error;

/// Unified error taxonomy for the payment engine.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Payport or change address fails chain validation.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// Negative, zero where positive is required, or sub-base-unit
    /// fractional precision.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// Post-subtraction external output at or below the dust threshold.
    #[error("output of {value} base units at or below dust threshold {dust_threshold}")]
    DustOutput { value: u64, dust_threshold: u64 },
    /// Selected inputs cannot cover the desired outputs plus fee.
    #[error("insufficient funds: required {required} base units, available {available}")]
    InsufficientFunds { required: u64, available: u64 },
    /// A bug, not a user error; callers must abort.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// Raised by the node facade; retried by the retry policy.
    #[error("transport disconnected: {0}")]
    TransportDisconnected(String),
    /// Propagated from the node facade as-is.
    #[error("server error: {0}")]
    Server(String),
    /// Balance activity cannot be classified. Scans log and skip these;
    /// only direct classification helpers surface them.
    #[error("balance activity indeterminate: {0}")]
    ActivityIndeterminate(String),
    /// Cooperative cancellation observed at a checkpoint.
    #[error("operation cancelled")]
    Cancelled,
}

/// Error surface of the injected node facades.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("transport disconnected: {0}")]
    Disconnected(String),
    #[error("node error: {0}")]
    Server(String),
}

/// Message prefix nodes use to report a transaction already in the
/// mempool. Broadcasts seeing it are treated as successful.
pub const MEMPOOL_DUPLICATE_SENTINEL: &str = "-27";

impl NodeError {
    pub fn is_mempool_duplicate(&self) -> bool {
        matches!(self, NodeError::Server(msg) if msg.trim_start().starts_with(MEMPOOL_DUPLICATE_SENTINEL))
    }
}

impl From<NodeError> for PaymentError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::Disconnected(msg) => PaymentError::TransportDisconnected(msg),
            NodeError::Server(msg) => PaymentError::Server(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mempool_duplicate_detection() {
        assert!(NodeError::Server("-27: transaction already in mempool".into()).is_mempool_duplicate());
        assert!(NodeError::Server(" -27 dup".into()).is_mempool_duplicate());
        assert!(!NodeError::Server("-26: insufficient fee".into()).is_mempool_duplicate());
        assert!(!NodeError::Disconnected("-27".into()).is_mempool_duplicate());
    }

    #[test]
    fn node_error_maps_to_payment_error() {
        assert!(matches!(
            PaymentError::from(NodeError::Disconnected("socket closed".into())),
            PaymentError::TransportDisconnected(_)
        ));
        assert!(matches!(
            PaymentError::from(NodeError::Server("boom".into())),
            PaymentError::Server(_)
        ));
    }
}
