use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::PaymentError;

/// Cooperative cancellation flag shared between a caller and a suspending
/// operation. Operations call [`CancelToken::checkpoint`] at each
/// suspension point; pure computation never observes the token.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn checkpoint(&self) -> Result<(), PaymentError> {
        if self.is_cancelled() {
            Err(PaymentError::Cancelled)
        } else {
            Ok(())
        }
    }
}
