//! Timer-backed deferred operations
//!
//! Each operation gets its own timer thread, which sleeps for the requested
//! delay, computes the operation's result and publishes it. Starting a timer
//! is the only fallible step: if the thread cannot be spawned, the caller
//! still receives a [`DeferredOperation`], which has already failed.

use crate::deferred::DeferredOperation;
use crate::status::OperationFailure;
use log::{debug, warn};
use std::thread;
use std::time::Duration;


/// Start a timer and return the operation which resolves when it expires
///
/// `work` runs on the timer thread once `delay` has elapsed, and its result
/// becomes the result of the operation.
///
pub fn after<T, F>(index: usize, delay: Duration, work: F) -> DeferredOperation<T>
    where T: Send + 'static,
          F: FnOnce() -> Result<T, OperationFailure> + Send + 'static
{
    let (mut resolver, operation) = DeferredOperation::new(index);
    let spawned = thread::Builder::new()
        .name(format!("timer-{}", index))
        .spawn(move || {
            resolver.start();
            thread::sleep(delay);
            debug!("timer {} expired after {:?}", index, delay);
            resolver.resolve(work());
        });

    match spawned {
        Ok(_) => operation,
        Err(e) => {
            warn!("cannot start timer {}: {}", index, e);
            DeferredOperation::failed(OperationFailure::Timer {
                index,
                reason: e.to_string(),
            })
        }
    }
}
