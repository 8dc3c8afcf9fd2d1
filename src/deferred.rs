//! Client side of deferred operations
//!
//! A [`DeferredOperation`] is the handle a driver receives when it invokes a
//! factory. It gives three ways to synchronize with the operation's result:
//!
//! - Blocking: [`DeferredOperation::wait`] parks the calling thread until the
//!   operation reaches a final status. Easy to reason about, but it ties up a
//!   whole thread per pending operation.
//! - Continuation: [`DeferredOperation::then`] schedules a callback which is
//!   executed inline by whoever publishes the final status, or immediately if
//!   that status is already known. This is what hand-rolled drivers build on.
//! - Future: `DeferredOperation` implements [`Future`], so it can simply be
//!   awaited from async code and combined with the `futures` combinators.
//!
//! Exactly one of these consumes the result. The server side of the
//! operation lives in the [`server`](crate::server) module.

use crate::server::Resolver;
use crate::status::{self, OperationFailure, OperationStatus, StatusKind};
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};


/// Callback run once with the final result of an operation
pub type Continuation<T> = Box<dyn FnOnce(Result<T, OperationFailure>) + Send>;


/// Handle to a deferred operation, owned by whichever driver invoked it
pub struct DeferredOperation<T> {
    /// State shared with the operation's resolver
    shared: Arc<Shared<T>>,

    /// Position of the operation in its task source
    index: usize,
}
//
impl<T: Send + 'static> DeferredOperation<T> {
    /// Create a pending operation, along with the resolver that will
    /// eventually publish its result
    pub fn new(index: usize) -> (Resolver<T>, Self) {
        let shared = Arc::new(Shared::new(OperationStatus::Pending));
        (
            Resolver::new(shared.clone(), index),
            DeferredOperation { shared, index },
        )
    }

    /// Create an operation which has already failed
    pub fn failed(failure: OperationFailure) -> Self {
        let index = failure.index();
        DeferredOperation {
            shared: Arc::new(Shared::new(OperationStatus::Error(failure))),
            index,
        }
    }

    /// Position of the operation in its task source
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check the current status of the operation without consuming it
    pub fn status(&self) -> StatusKind {
        self.shared.kind()
    }

    /// Block the calling thread until the operation reaches a final status
    pub fn wait(self) -> Result<T, OperationFailure> {
        let mut slot = self.shared.lock();
        while !status::is_final(&slot.status) && !slot.consumed {
            slot = self.shared
                       .update_cv
                       .wait(slot)
                       .unwrap_or_else(PoisonError::into_inner);
        }
        slot.take(self.index)
    }

    /// Take the result right away if the operation is already final, or
    /// hand the operation back otherwise
    pub fn try_take(self) -> Result<Result<T, OperationFailure>, Self> {
        let mut slot = self.shared.lock();
        if status::is_final(&slot.status) || slot.consumed {
            return Ok(slot.take(self.index));
        }
        drop(slot);
        Err(self)
    }

    /// Attach a continuation which runs once the operation is final
    ///
    /// If the result is already known, the continuation runs right away on
    /// the calling thread. Otherwise, it will run on the thread which
    /// publishes the final status.
    ///
    pub fn then<F>(self, continuation: F)
        where F: FnOnce(Result<T, OperationFailure>) + Send + 'static
    {
        let mut slot = self.shared.lock();
        if status::is_final(&slot.status) || slot.consumed {
            let result = slot.take(self.index);
            drop(slot);
            continuation(result);
        } else {
            slot.continuation = Some(Box::new(continuation));
        }
    }
}
//
impl<T> Future for DeferredOperation<T> {
    type Output = Result<T, OperationFailure>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let index = self.index;
        let mut slot = self.shared.lock();
        if status::is_final(&slot.status) || slot.consumed {
            return Poll::Ready(slot.take(index));
        }
        let stale = slot.waker
                        .as_ref()
                        .map_or(true, |waker| !waker.will_wake(cx.waker()));
        if stale {
            slot.waker = Some(cx.waker().clone());
        }
        Poll::Pending
    }
}


/// State shared between an operation's resolver and its client
pub(crate) struct Shared<T> {
    /// Current operation status and pending notifications (mutex-protected)
    slot: Mutex<Slot<T>>,

    /// Condition variable used to wake up blocking clients
    update_cv: Condvar,
}
//
impl<T> Shared<T> {
    fn new(status: OperationStatus<T>) -> Self {
        Shared {
            slot: Mutex::new(Slot {
                status,
                consumed: false,
                continuation: None,
                waker: None,
            }),
            update_cv: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn kind(&self) -> StatusKind {
        let slot = self.lock();
        if slot.consumed {
            StatusKind::Consumed
        } else {
            slot.status.kind()
        }
    }

    /// Publish a new operation status, notifying whoever listens to it
    pub(crate) fn publish(&self, index: usize, status: OperationStatus<T>) {
        let mut slot = self.lock();
        let is_final = status::is_final(&status);
        slot.status = status;

        // A registered continuation takes over the final result directly
        if is_final {
            if let Some(continuation) = slot.continuation.take() {
                let result = slot.take(index);
                drop(slot);
                continuation(result);
                return;
            }
        }

        let waker = slot.waker.take();
        drop(slot);
        self.update_cv.notify_all();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}


/// Operation status, along with the ways a client may be waiting for it
struct Slot<T> {
    status: OperationStatus<T>,

    /// Whether the final result was already handed over to the client
    consumed: bool,

    continuation: Option<Continuation<T>>,
    waker: Option<Waker>,
}
//
impl<T> Slot<T> {
    /// Hand over the final result, which can only happen once
    fn take(&mut self, index: usize) -> Result<T, OperationFailure> {
        if self.consumed {
            return Err(OperationFailure::Abandoned { index });
        }
        let status = mem::replace(&mut self.status, OperationStatus::Pending);
        self.consumed = true;
        match status.into_result() {
            Ok(result) => result,
            Err(_) => Err(OperationFailure::Abandoned { index }),
        }
    }
}
