//! Server side of deferred operations
//!
//! Whoever performs the work behind a deferred operation (in this crate, a
//! timer thread) holds its [`Resolver`] and uses it to publish status updates.
//! The resolver is deliberately kept apart from the client handle, so that a
//! driver can never complete an operation on its own behalf.

use crate::deferred::Shared;
use crate::status::{self, OperationFailure, OperationStatus};
use std::sync::Arc;


/// Server interface, used to submit operation status updates
pub struct Resolver<T> {
    /// State shared with the client handle
    shared: Arc<Shared<T>>,

    /// Position of the operation in its task source
    index: usize,

    /// Flag indicating that the operation status has reached a final state
    /// and should not change anymore
    reached_final_status: bool,
}
//
impl<T> Resolver<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>, index: usize) -> Self {
        Resolver {
            shared,
            index,
            reached_final_status: false,
        }
    }

    /// Position of the operation in its task source
    pub fn index(&self) -> usize {
        self.index
    }

    /// Signal that the work behind the operation has started
    pub fn start(&mut self) {
        self.update(OperationStatus::Running);
    }

    /// Publish the final result of the operation
    pub fn resolve(mut self, result: Result<T, OperationFailure>) {
        self.update(result.into());
    }

    /// Update the current status of the operation
    fn update(&mut self, status: OperationStatus<T>) {
        // This should only happen if we have not yet reached a final status
        debug_assert!(!self.reached_final_status);
        self.reached_final_status = status::is_final(&status);

        // Propagate the new operation status
        self.shared.publish(self.index, status);
    }
}
//
impl<T> Drop for Resolver<T> {
    /// If the resolver is dropped before the operation has reached its final
    /// status, notify the client in order to prevent it from hanging
    fn drop(&mut self) {
        if !self.reached_final_status {
            let index = self.index;
            self.update(OperationStatus::Error(
                OperationFailure::Abandoned { index }
            ));
        }
    }
}
