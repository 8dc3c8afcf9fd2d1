//! External cancellation of driver runs
//!
//! A driver run can be asked to stop by whoever holds a clone of its
//! [`CancelToken`]. The precise semantics are deliberately limited: the
//! request is only honored between operations, i.e. a driver checks the
//! token right before invoking its next factory. An operation which is
//! already in flight is abandoned rather than interrupted, and its timer is
//! left to expire on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;


/// Shared flag used to request that a driver stops early
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}
//
impl CancelToken {
    /// Create a token which has not been triggered yet
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Request that the driver stops before its next operation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
